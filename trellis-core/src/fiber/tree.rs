//! Fiber Arena
//!
//! All fibers of the committed tree and of the tree under construction live
//! in one generational slot map. Tree links (`parent`, `child`, `sibling`)
//! and the cross-tree `alternate` link are plain ids, so there is no
//! ownership cycle; a tree is released by removing its ids.

use slotmap::SlotMap;

use super::node::{Fiber, FiberId};

/// Arena owning every live fiber.
pub struct FiberArena<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> FiberArena<N> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    /// Get a reference to a fiber.
    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    /// Whether `id` is still live.
    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Number of live fibers across both trees.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Whether no fiber is live.
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Iterate over the sibling chain below `parent`.
    pub fn children(&self, parent: FiberId) -> Children<'_, N> {
        Children {
            arena: self,
            next: self.get(parent).and_then(|fiber| fiber.child),
        }
    }

    /// Depth-first successor: first child, else the nearest sibling found by
    /// walking up the parent chain, else `None` once the walk leaves the tree.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// `root` and all of its descendants, in pre-order.
    pub fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            let mut children: Vec<FiberId> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Nearest ancestor of `id` that carries a display node.
    pub fn host_parent(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = self.get(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if fiber.state_node.is_some() {
                return Some(current);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Remove `root` and its descendants. Returns how many fibers were freed.
    pub(crate) fn release(&mut self, root: FiberId) -> usize {
        let ids = self.subtree(root);
        for id in &ids {
            self.fibers.remove(*id);
        }
        ids.len()
    }
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a sibling chain.
pub struct Children<'a, N> {
    arena: &'a FiberArena<N>,
    next: Option<FiberId>,
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = self.arena.get(id).and_then(|fiber| fiber.sibling);
        Some(id)
    }
}
