//! Display Backends
//!
//! The engine never builds display nodes itself. It asks a [`Backend`] to
//! create a node for a leaf element, to patch attributes, and to move nodes
//! around in the backend's tree. Everything else (which nodes exist, how
//! attributes map onto them) is the backend's business.
//!
//! # Contract
//!
//! - `create_node` is a pure mapping from one element to one detached node.
//!   It never recurses into children or components; `Empty` maps to `None`.
//! - Structural calls (`insert_before`, `append_child`, `remove_child`) are
//!   only made during commit.
//! - `child_at` is used to locate insertion anchors. It must reflect the
//!   mutations applied so far in the same commit.
//! - A removed node is never handed back to the backend, so implementations
//!   may release it together with its descendants.
//!
//! [`MemoryBackend`] is the reference implementation; it keeps the whole
//! tree in memory and records every mutation.

mod memory;

pub use memory::{DomNode, DomNodeId, DomNodeKind, DomSnapshot, MemoryBackend, Mutation};

use std::fmt::Debug;

use crate::element::{AttributePatch, Element};
use crate::error::BackendError;

/// Operations the engine needs from a display tree.
pub trait Backend {
    /// Handle to a display node.
    type Node: Clone + PartialEq + Debug;

    /// Create a detached node for a text or native element. Returns `None`
    /// for elements that render to nothing.
    fn create_node(&mut self, element: &Element) -> Result<Option<Self::Node>, BackendError>;

    /// Apply an attribute delta to an existing node.
    fn apply_patch(&mut self, node: &Self::Node, patch: &AttributePatch) -> Result<(), BackendError>;

    /// Replace the content of a text node.
    fn set_text(&mut self, node: &Self::Node, text: &str) -> Result<(), BackendError>;

    /// The child currently at `index` under `parent`.
    fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

    /// Insert `node` under `parent`, immediately before `anchor`.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        node: &Self::Node,
        anchor: &Self::Node,
    ) -> Result<(), BackendError>;

    /// Append `node` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), BackendError>;

    /// Detach `node` from `parent`. The engine does not use `node` again.
    fn remove_child(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), BackendError>;
}
