//! Fiber Nodes
//!
//! This module defines the unit of work that lives in the fiber arena.

use slotmap::new_key_type;

use crate::element::{Element, SharedInstance};
use crate::hooks::HookList;

new_key_type! {
    /// Stable, generational identifier of a fiber in the arena.
    ///
    /// A stale id (one whose fiber has been released) resolves to nothing
    /// instead of aliasing a newer fiber.
    pub struct FiberId;
}

/// The mutation a fiber requires during commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTag {
    /// Nothing to do (the root, or a fiber whose parent was freshly placed).
    #[default]
    None,

    /// A new display node has to be inserted.
    Placement,

    /// An existing display node is kept and patched.
    Update,

    /// The display node of an old fiber has to be removed.
    Deletion,
}

/// One element's position in the tree for one render pass.
pub struct Fiber<N> {
    /// The element this fiber renders. Replaced wholesale, never mutated.
    pub(crate) element: Element,

    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,

    /// The fiber at the same position in the previous committed tree.
    pub(crate) alternate: Option<FiberId>,

    /// The display node rendering this fiber, if it has one.
    pub(crate) state_node: Option<N>,

    pub(crate) effect: EffectTag,

    /// Position among siblings, recorded at Placement.
    pub(crate) index: usize,

    /// Class component instance.
    pub(crate) instance: Option<SharedInstance>,

    /// Function component hook slots.
    pub(crate) hooks: HookList,
}

impl<N> Fiber<N> {
    pub(crate) fn new(element: Element, parent: Option<FiberId>) -> Self {
        Self {
            element,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            state_node: None,
            effect: EffectTag::None,
            index: 0,
            instance: None,
            hooks: HookList::new(),
        }
    }

    /// Element this fiber was built from.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Parent fiber; `None` for a root.
    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// First child fiber.
    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    /// Next sibling fiber.
    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Fiber at the same position in the previous tree.
    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    /// Display node owned by this fiber, if any.
    pub fn state_node(&self) -> Option<&N> {
        self.state_node.as_ref()
    }

    /// Commit action assigned during reconciliation.
    pub fn effect(&self) -> EffectTag {
        self.effect
    }

    /// Position among the parent's children.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this fiber is backed by a display node of its own kind
    /// (native elements and text).
    pub fn is_host(&self) -> bool {
        matches!(self.element, Element::Native(_) | Element::Text(_))
    }

    /// Whether this fiber renders a component.
    pub fn is_composite(&self) -> bool {
        matches!(self.element, Element::Component(_))
    }
}

impl<N: std::fmt::Debug> std::fmt::Debug for Fiber<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fiber")
            .field("element", &self.element.describe())
            .field("effect", &self.effect)
            .field("index", &self.index)
            .field("state_node", &self.state_node)
            .field("alternate", &self.alternate)
            .finish()
    }
}
