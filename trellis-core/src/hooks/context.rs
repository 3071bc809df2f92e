//! Hook Context
//!
//! Every invocation of a function component gets its own [`Hooks`] value. It
//! carries the hook cursor, the previous render's hook list (read-only) and
//! the slots produced by this invocation. Nothing is shared between
//! invocations, so the call order of one component can never disturb another.
//!
//! The previous list comes from the fiber's alternate. Slot `i` of this
//! render pairs with slot `i` of the previous one, so hooks must be called in
//! the same order on every render.

use std::any::Any;
use std::sync::Arc;

use smallvec::SmallVec;

use super::state::{StateCell, StateSetter};
use super::Updater;
use crate::error::RenderError;

/// Type-erased hook slot stored on a fiber.
pub(crate) type HookSlot = Arc<dyn Any + Send + Sync>;

pub(crate) type HookList = SmallVec<[HookSlot; 4]>;

/// Per-invocation hook context handed to function components.
pub struct Hooks<'a> {
    component: &'a str,
    cursor: usize,
    previous: &'a [HookSlot],
    slots: HookList,
    updater: &'a Updater,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(component: &'a str, previous: &'a [HookSlot], updater: &'a Updater) -> Self {
        Self {
            component,
            cursor: 0,
            previous,
            slots: HookList::new(),
            updater,
        }
    }

    /// Local state. Returns the current value and a setter that schedules a
    /// re-render.
    pub fn use_state<T>(&mut self, initial: T) -> Result<(T, StateSetter<T>), RenderError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.use_state_with(move || initial)
    }

    /// Like [`Hooks::use_state`], computing the initial value only on the
    /// first render.
    pub fn use_state_with<T, F>(&mut self, init: F) -> Result<(T, StateSetter<T>), RenderError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let index = self.cursor;
        self.cursor += 1;

        let state = match self.previous.get(index) {
            Some(slot) => {
                let cell = Arc::clone(slot)
                    .downcast::<StateCell<T>>()
                    .map_err(|_| RenderError::HookMismatch {
                        component: self.component.to_string(),
                        index,
                        requested: std::any::type_name::<T>(),
                    })?;
                cell.resolved()
            }
            None => init(),
        };

        let cell = Arc::new(StateCell::new(state.clone()));
        self.slots.push(Arc::clone(&cell) as HookSlot);

        Ok((state, StateSetter::new(cell, self.updater.clone())))
    }

    /// A handle that schedules a re-render without going through state.
    pub fn updater(&self) -> Updater {
        self.updater.clone()
    }

    /// Number of hooks called so far in this invocation.
    pub fn hook_count(&self) -> usize {
        self.cursor
    }

    pub(crate) fn into_slots(self) -> HookList {
        self.slots
    }
}
