//! Child Reconciliation
//!
//! Pairs a fiber's new child elements with the previous render's children,
//! position by position, and tags every pair with the effect the commit has
//! to perform.
//!
//! # Algorithm
//!
//! Walk the new element list and the old sibling chain
//! (`parent.alternate.child`, `.sibling`, ...) in lockstep:
//!
//! 1. Old fiber present and of the same type: new fiber reusing the old
//!    display node, tagged `Update`, with `alternate` pointing at the old one.
//! 2. Otherwise a new element becomes a fresh `Placement` fiber, and an old
//!    fiber at the same position is tagged `Deletion` and queued for removal.
//!    A type change is always delete + insert, never an in-place swap.
//! 3. Both cursors advance every step; the walk ends when both run out.
//!
//! Keys are ignored. Moving an item is realized as deletions and placements.

use crate::element::{ChildList, Element};
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};

/// Counts of the tags assigned by one reconciliation step, reported in the
/// per-unit trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ReconcileSummary {
    pub updates: usize,
    pub placements: usize,
    pub deletions: usize,
}

/// Build the new child chain of `parent` from `elements`.
///
/// Old fibers elected for deletion are tagged and appended to `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    parent: FiberId,
    elements: ChildList,
    deletions: &mut Vec<FiberId>,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    let mut old = arena
        .get(parent)
        .and_then(|fiber| fiber.alternate)
        .and_then(|alternate| arena.get(alternate))
        .and_then(|alternate| alternate.child);

    let mut elements = elements.into_iter();
    let mut first: Option<FiberId> = None;
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    loop {
        let element = elements.next();
        if element.is_none() && old.is_none() {
            break;
        }

        let old_fiber = old.and_then(|id| arena.get(id).map(|fiber| (id, fiber)));
        let next_old = old_fiber.and_then(|(_, fiber)| fiber.sibling);
        let reusable = match (&element, old_fiber) {
            (Some(element), Some((id, fiber))) if element.same_type(&fiber.element) => {
                Some((id, fiber.state_node.clone()))
            }
            _ => None,
        };

        let new_fiber = match (element, reusable) {
            (Some(element), Some((old_id, state_node))) => {
                summary.updates += 1;
                Some(updated(element, parent, old_id, state_node, index))
            }
            (element, _) => {
                if let Some(old_id) = old.filter(|id| arena.contains(*id)) {
                    summary.deletions += 1;
                    if let Some(fiber) = arena.get_mut(old_id) {
                        fiber.effect = EffectTag::Deletion;
                    }
                    deletions.push(old_id);
                }
                element.map(|element| {
                    summary.placements += 1;
                    placed(element, parent, index)
                })
            }
        };

        if let Some(fiber) = new_fiber {
            let id = arena.insert(fiber);
            match previous.and_then(|prev| arena.get_mut(prev)) {
                Some(prev) => prev.sibling = Some(id),
                None => first = Some(id),
            }
            previous = Some(id);
        }

        old = next_old;
        index += 1;
    }

    if let Some(fiber) = arena.get_mut(parent) {
        fiber.child = first;
    }

    summary
}

fn updated<N>(
    element: Element,
    parent: FiberId,
    alternate: FiberId,
    state_node: Option<N>,
    index: usize,
) -> Fiber<N> {
    let mut fiber = Fiber::new(element, Some(parent));
    fiber.alternate = Some(alternate);
    fiber.state_node = state_node;
    fiber.effect = EffectTag::Update;
    fiber.index = index;
    fiber
}

fn placed<N>(element: Element, parent: FiberId, index: usize) -> Fiber<N> {
    let mut fiber = Fiber::new(element, Some(parent));
    fiber.effect = EffectTag::Placement;
    fiber.index = index;
    fiber
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;

    fn tag(name: &str) -> Element {
        Element::native(name, Props::new())
    }

    /// Committed parent with children of the given tags, each owning a fake
    /// display node numbered from 100. Returns the new work-in-progress
    /// parent aliasing it and the old child ids.
    fn committed(arena: &mut FiberArena<u32>, tags: &[&str]) -> (FiberId, Vec<FiberId>) {
        let old_parent = arena.insert(Fiber::new(tag("ul"), None));
        let mut old_children = Vec::new();
        let mut previous: Option<FiberId> = None;
        for (i, name) in tags.iter().enumerate() {
            let mut fiber = Fiber::new(tag(name), Some(old_parent));
            fiber.state_node = Some(100 + i as u32);
            let id = arena.insert(fiber);
            match previous {
                Some(prev) => arena.get_mut(prev).unwrap().sibling = Some(id),
                None => arena.get_mut(old_parent).unwrap().child = Some(id),
            }
            previous = Some(id);
            old_children.push(id);
        }

        let mut wip = Fiber::new(tag("ul"), None);
        wip.alternate = Some(old_parent);
        (arena.insert(wip), old_children)
    }

    fn effects(arena: &FiberArena<u32>, parent: FiberId) -> Vec<(String, EffectTag)> {
        arena
            .children(parent)
            .map(|id| {
                let fiber = arena.get(id).unwrap();
                (fiber.element().describe(), fiber.effect())
            })
            .collect()
    }

    #[test]
    fn first_render_places_everything() {
        let mut arena = FiberArena::<u32>::new();
        let parent = arena.insert(Fiber::new(tag("ul"), None));
        let mut deletions = Vec::new();

        let summary = reconcile_children(
            &mut arena,
            parent,
            ChildList::from_iter([tag("li"), Element::text("x"), Element::Empty]),
            &mut deletions,
        );

        assert_eq!(summary.placements, 3);
        assert!(deletions.is_empty());
        let indices: Vec<_> = arena
            .children(parent)
            .map(|id| arena.get(id).unwrap().index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn positional_matching_updates_places_and_deletes() {
        let mut arena = FiberArena::<u32>::new();
        let (parent, old) = committed(&mut arena, &["a", "b", "c"]);
        let mut deletions = Vec::new();

        let summary = reconcile_children(
            &mut arena,
            parent,
            ChildList::from_iter([tag("a"), tag("d")]),
            &mut deletions,
        );

        assert_eq!(
            effects(&arena, parent),
            vec![
                ("a".to_string(), EffectTag::Update),
                ("d".to_string(), EffectTag::Placement),
            ]
        );
        assert_eq!(deletions, vec![old[1], old[2]]);
        assert_eq!(arena.get(old[1]).unwrap().effect(), EffectTag::Deletion);
        assert_eq!(
            summary,
            ReconcileSummary {
                updates: 1,
                placements: 1,
                deletions: 2
            }
        );
    }

    #[test]
    fn updated_fiber_reuses_display_node_and_links_alternate() {
        let mut arena = FiberArena::<u32>::new();
        let (parent, old) = committed(&mut arena, &["a"]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, parent, ChildList::from_iter([tag("a")]), &mut deletions);

        let child = arena.get(parent).unwrap().child().unwrap();
        let fiber = arena.get(child).unwrap();
        assert_eq!(fiber.state_node(), Some(&100));
        assert_eq!(fiber.alternate(), Some(old[0]));
    }

    #[test]
    fn extra_new_positions_are_placed() {
        for old_len in 0..4 {
            for new_len in old_len..6 {
                let mut arena = FiberArena::<u32>::new();
                let tags = vec!["li"; old_len];
                let (parent, _) = committed(&mut arena, &tags);
                let mut deletions = Vec::new();

                let summary = reconcile_children(
                    &mut arena,
                    parent,
                    (0..new_len).map(|_| tag("li")).collect(),
                    &mut deletions,
                );

                assert_eq!(summary.updates, old_len);
                assert_eq!(summary.placements, new_len - old_len);
                assert_eq!(summary.deletions, 0);
            }
        }
    }

    #[test]
    fn extra_old_positions_are_deleted() {
        let mut arena = FiberArena::<u32>::new();
        let (parent, old) = committed(&mut arena, &["li", "li", "li", "li"]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, parent, ChildList::from_iter([tag("li")]), &mut deletions);

        assert_eq!(deletions, old[1..].to_vec());
        assert_eq!(arena.children(parent).count(), 1);
    }

    #[test]
    fn type_change_is_delete_plus_insert() {
        let mut arena = FiberArena::<u32>::new();
        let (parent, old) = committed(&mut arena, &["p"]);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, parent, ChildList::from_iter([tag("span")]), &mut deletions);

        let child = arena.get(parent).unwrap().child().unwrap();
        let fiber = arena.get(child).unwrap();
        assert_eq!(fiber.effect(), EffectTag::Placement);
        assert!(fiber.state_node().is_none());
        assert!(fiber.alternate().is_none());
        assert_eq!(deletions, vec![old[0]]);
    }
}
