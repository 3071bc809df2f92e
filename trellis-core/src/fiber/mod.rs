//! Fiber Tree
//!
//! The fiber tree is the engine's mutable work tree. It mirrors the element
//! tree: one fiber per flattened element, linked to its parent, first child
//! and next sibling.
//!
//! # Two Trees
//!
//! At any time the arena holds up to two trees:
//!
//! - `current`: the last committed tree, i.e. what is on screen.
//! - `work-in-progress`: the tree under construction.
//!
//! Each work-in-progress fiber points at its counterpart in `current`
//! through `alternate`. The reconciler reads the alternate to decide what
//! changed; nothing ever writes through it. When a commit finishes the
//! work-in-progress root becomes `current` and the old tree is released.
//!
//! # Design Decisions
//!
//! 1. Fibers live in a generational arena and refer to each other by id.
//!    Parent links always point toward the root and alternates cross trees,
//!    so there is no ownership cycle to manage.
//!
//! 2. Releasing the previous tree invalidates its ids. A leftover alternate
//!    id then resolves to nothing rather than to an unrelated fiber.

mod node;
mod tree;

pub use node::{EffectTag, Fiber, FiberId};
pub use tree::{Children, FiberArena};
