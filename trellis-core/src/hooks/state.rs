//! State Cells
//!
//! Local component state lives in shared cells rather than in the engine.
//!
//! - Function components get one [`StateCell`] per `use_state` slot and per
//!   render. A setter never writes the state directly; it appends an action to
//!   the cell's queue. The next render replays the queue over the stored value
//!   into a fresh cell, so reading the previous render's cell never mutates it.
//! - Class components keep a [`ComponentState`] for their whole lifetime and
//!   mutate it in place.
//!
//! Either way the mutation ends with [`Updater::schedule`].

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::Updater;

type Action<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

struct CellInner<T> {
    state: T,
    queue: Vec<Action<T>>,
}

/// One `use_state` slot of one render.
pub struct StateCell<T> {
    inner: Mutex<CellInner<T>>,
}

impl<T> StateCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(state: T) -> Self {
        Self {
            inner: Mutex::new(CellInner {
                state,
                queue: Vec::new(),
            }),
        }
    }

    /// The stored state with every queued action applied. The cell is left
    /// as it was.
    pub(crate) fn resolved(&self) -> T {
        let inner = self.inner.lock();
        inner
            .queue
            .iter()
            .fold(inner.state.clone(), |state, action| action(&state))
    }

    fn enqueue(&self, action: Action<T>) {
        self.inner.lock().queue.push(action);
    }

    pub(crate) fn queued(&self) -> usize {
        self.inner.lock().queue.len()
    }
}

/// Setter returned by [`super::Hooks::use_state`].
pub struct StateSetter<T> {
    cell: Arc<StateCell<T>>,
    updater: Updater,
}

impl<T> StateSetter<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(cell: Arc<StateCell<T>>, updater: Updater) -> Self {
        Self { cell, updater }
    }

    /// Replace the state on the next render.
    pub fn set(&self, value: T) {
        self.cell.enqueue(Arc::new(move |_| value.clone()));
        self.updater.schedule();
    }

    /// Derive the next state from the previous one on the next render.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.cell.enqueue(Arc::new(f));
        self.updater.schedule();
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            updater: self.updater.clone(),
        }
    }
}

/// Long-lived state of a class component.
///
/// Clones share the same value, so a component can move one into its event
/// handlers and keep another for `render`.
pub struct ComponentState<S> {
    value: Arc<RwLock<S>>,
    updater: Updater,
}

impl<S> ComponentState<S>
where
    S: Send + Sync + 'static,
{
    /// Create state that schedules re-renders through `updater`.
    pub fn new(initial: S, updater: Updater) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            updater,
        }
    }

    /// Read the state through a closure.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.value.read())
    }

    /// Current value.
    pub fn get(&self) -> S
    where
        S: Clone,
    {
        self.value.read().clone()
    }

    /// Mutate the state and schedule a re-render.
    pub fn set_state(&self, f: impl FnOnce(&mut S)) {
        f(&mut self.value.write());
        self.updater.schedule();
    }

    /// Replace the state and schedule a re-render.
    pub fn replace(&self, value: S) {
        *self.value.write() = value;
        self.updater.schedule();
    }
}

impl<S> Clone for ComponentState<S> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            updater: self.updater.clone(),
        }
    }
}
