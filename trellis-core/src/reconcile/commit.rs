//! Commit Phase
//!
//! Applies a finished work-in-progress tree to the display backend in one
//! uninterrupted pass.
//!
//! # Order
//!
//! 1. Every fiber queued for deletion is removed first, so that later
//!    placements compute their anchors against the post-deletion layout.
//! 2. The new tree is walked depth-first: children before the fiber itself,
//!    earlier siblings before later ones. `Placement` inserts the fiber's
//!    display node, `Update` patches it.
//!
//! # Anchors
//!
//! Composite and empty fibers have no display node, so a fiber's sibling
//! index does not line up with its parent node's child list. The insertion
//! slot is instead the number of display nodes that precede the fiber in
//! host order below the same host parent. All of them are attached by the
//! time the fiber is reached: older ones survived the deletion pass, newer
//! ones were placed earlier in this walk.
//!
//! # Failures
//!
//! Once the deletion pass has run, the display no longer matches the old
//! tree, so a backend error never stops the walk. Failed effects are logged
//! and skipped, the rest of the tree is applied, and the first error is
//! returned at the end. The caller promotes the new tree either way.

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::element::{AttributePatch, Element};
use crate::error::RenderError;
use crate::fiber::{EffectTag, FiberArena, FiberId};

/// What one commit did to the display tree.
///
/// `updates` counts only effective writes: an `Update` fiber whose props
/// and text are unchanged is counted in `unchanged` instead. Likewise
/// `deletions` counts deleted fibers that actually had display nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

impl CommitReport {
    /// Whether the commit left the display tree untouched.
    pub fn is_noop(&self) -> bool {
        self.placements == 0 && self.updates == 0 && self.deletions == 0
    }
}

/// Apply `deletions` and then the effects of the tree below `root`.
///
/// Both passes always run to the end. If any effect failed, the first
/// failure is returned after everything else has been applied.
#[tracing::instrument(level = "debug", skip_all, fields(deletions = deletions.len()))]
pub(crate) fn commit_root<B: Backend>(
    arena: &FiberArena<B::Node>,
    backend: &mut B,
    root: FiberId,
    deletions: &[FiberId],
) -> Result<CommitReport, RenderError> {
    let mut report = CommitReport::default();
    let mut failure = None;

    for &id in deletions {
        commit_deletion(arena, backend, id, &mut report);
    }

    for child in arena.children(root) {
        commit_work(arena, backend, child, &mut report, &mut failure);
    }

    debug!(
        placements = report.placements,
        updates = report.updates,
        deletions = report.deletions,
        unchanged = report.unchanged,
        failed = failure.is_some(),
        "commit finished"
    );
    match failure {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

fn commit_work<B: Backend>(
    arena: &FiberArena<B::Node>,
    backend: &mut B,
    id: FiberId,
    report: &mut CommitReport,
    failure: &mut Option<RenderError>,
) {
    for child in arena.children(id) {
        commit_work(arena, backend, child, report, failure);
    }

    let Some(fiber) = arena.get(id) else {
        return;
    };
    let applied = match fiber.effect {
        EffectTag::Placement => commit_placement(arena, backend, id, report),
        EffectTag::Update => commit_update(arena, backend, id, report),
        EffectTag::None | EffectTag::Deletion => Ok(()),
    };
    if let Err(err) = applied {
        warn!(error = %err, fiber = ?id, "commit effect failed; continuing");
        if failure.is_none() {
            *failure = Some(err);
        }
    }
}

fn commit_placement<B: Backend>(
    arena: &FiberArena<B::Node>,
    backend: &mut B,
    id: FiberId,
    report: &mut CommitReport,
) -> Result<(), RenderError> {
    // composite and empty fibers are placed through their descendants
    let Some(node) = arena.get(id).and_then(|fiber| fiber.state_node.clone()) else {
        return Ok(());
    };
    let Some((parent_id, parent)) = host_parent_node(arena, id) else {
        warn!(fiber = ?id, "placement without a host parent; skipped");
        return Ok(());
    };

    // a freshly placed parent has no children that could follow this one
    let fresh_parent = arena
        .get(parent_id)
        .is_some_and(|fiber| fiber.effect == EffectTag::Placement);
    let anchor = if fresh_parent {
        None
    } else {
        backend
            .child_at(&parent, host_slot(arena, parent_id, id))
            .filter(|anchor| *anchor != node)
    };

    match anchor {
        Some(anchor) => {
            if let Err(err) = backend.insert_before(&parent, &node, &anchor) {
                warn!(error = %err, fiber = ?id, "anchored insert failed; appending instead");
                backend.append_child(&parent, &node)?;
            }
        }
        None => backend.append_child(&parent, &node)?,
    }

    report.placements += 1;
    Ok(())
}

fn commit_update<B: Backend>(
    arena: &FiberArena<B::Node>,
    backend: &mut B,
    id: FiberId,
    report: &mut CommitReport,
) -> Result<(), RenderError> {
    let Some(fiber) = arena.get(id) else {
        return Ok(());
    };
    let previous = fiber.alternate.and_then(|alternate| arena.get(alternate));

    match (&fiber.element, previous.map(|old| &old.element), &fiber.state_node) {
        (Element::Native(new), Some(Element::Native(old)), Some(node)) => {
            let patch = AttributePatch::between(&old.props, &new.props);
            if patch.is_empty() {
                report.unchanged += 1;
            } else {
                backend.apply_patch(node, &patch)?;
                report.updates += 1;
            }
        }
        (Element::Text(new), Some(Element::Text(old)), Some(node)) => {
            if new == old {
                report.unchanged += 1;
            } else {
                backend.set_text(node, new)?;
                report.updates += 1;
            }
        }
        _ => report.unchanged += 1,
    }
    Ok(())
}

fn commit_deletion<B: Backend>(
    arena: &FiberArena<B::Node>,
    backend: &mut B,
    id: FiberId,
    report: &mut CommitReport,
) {
    let Some((_, parent)) = host_parent_node(arena, id) else {
        warn!(fiber = ?id, "deleted fiber has no host parent; skipped");
        return;
    };

    let mut nodes = Vec::new();
    collect_top_nodes(arena, id, &mut nodes);
    if nodes.is_empty() {
        return;
    }
    for node in nodes {
        if let Err(err) = backend.remove_child(&parent, &node) {
            warn!(error = %err, fiber = ?id, "failed to remove display node");
        }
    }
    report.deletions += 1;
}

fn host_parent_node<N: Clone>(arena: &FiberArena<N>, id: FiberId) -> Option<(FiberId, N)> {
    let parent = arena.host_parent(id)?;
    let node = arena.get(parent)?.state_node.clone()?;
    Some((parent, node))
}

/// The display nodes directly representing `id`: its own node, or the
/// top-most nodes below it when it is composite or empty.
fn collect_top_nodes<N: Clone>(arena: &FiberArena<N>, id: FiberId, out: &mut Vec<N>) {
    let Some(fiber) = arena.get(id) else {
        return;
    };
    match &fiber.state_node {
        Some(node) => out.push(node.clone()),
        None => {
            for child in arena.children(id) {
                collect_top_nodes(arena, child, out);
            }
        }
    }
}

/// Number of display nodes preceding `target` in host order below `host`.
fn host_slot<N>(arena: &FiberArena<N>, host: FiberId, target: FiberId) -> usize {
    fn visit<N>(arena: &FiberArena<N>, id: FiberId, target: FiberId, count: &mut usize) -> bool {
        for child in arena.children(id) {
            if child == target {
                return true;
            }
            let Some(fiber) = arena.get(child) else {
                continue;
            };
            if fiber.state_node.is_some() {
                *count += 1;
            } else if visit(arena, child, target, count) {
                return true;
            }
        }
        false
    }

    let mut count = 0;
    visit(arena, host, target, &mut count);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Mutation};
    use crate::element::{ChildList, Props};
    use crate::reconcile::diff::reconcile_children;

    fn li(text: &str) -> Element {
        Element::native("li", Props::new().child(text))
    }

    /// Build one full tree by hand-driving reconciliation, the way the work
    /// loop does, and commit it.
    fn build_and_commit(
        arena: &mut FiberArena<crate::backend::DomNodeId>,
        backend: &mut MemoryBackend,
        previous: Option<FiberId>,
        items: Vec<Element>,
    ) -> (FiberId, CommitReport) {
        let mut root = crate::fiber::Fiber::new(Element::list(items), None);
        root.state_node = Some(backend.container());
        root.alternate = previous;
        let root = arena.insert(root);

        let mut deletions = Vec::new();
        let mut next = Some(root);
        while let Some(id) = next {
            let fiber = arena.get(id).unwrap();
            let element = fiber.element().clone();
            if fiber.is_host() && fiber.state_node().is_none() {
                let node = backend.create_node(&element).unwrap();
                arena.get_mut(id).unwrap().state_node = node;
            }
            let children: ChildList = element.child_input().iter().cloned().collect();
            reconcile_children(arena, id, children, &mut deletions);
            next = arena.next_unit(id);
        }

        let report = commit_root(arena, backend, root, &deletions).unwrap();
        (root, report)
    }

    #[test]
    fn first_commit_places_in_order() {
        let mut arena = FiberArena::new();
        let mut backend = MemoryBackend::new();

        let (_, report) = build_and_commit(
            &mut arena,
            &mut backend,
            None,
            vec![li("a"), li("b"), li("c")],
        );

        assert_eq!(backend.to_html(), "<li>a</li><li>b</li><li>c</li>");
        // three items and their three text nodes
        assert_eq!(report.placements, 6);
    }

    #[test]
    fn removing_middle_item_is_one_deletion_and_one_update() {
        let mut arena = FiberArena::new();
        let mut backend = MemoryBackend::new();
        let (first, _) = build_and_commit(
            &mut arena,
            &mut backend,
            None,
            vec![li("item1"), li("item2"), li("item3")],
        );

        let (_, report) = build_and_commit(
            &mut arena,
            &mut backend,
            Some(first),
            vec![li("item1"), li("item3")],
        );

        assert_eq!(backend.to_html(), "<li>item1</li><li>item3</li>");
        assert_eq!(report.deletions, 1);
        assert_eq!(report.updates, 1);
        assert_eq!(report.placements, 0);
    }

    #[test]
    fn deletions_run_before_insertions() {
        let mut arena = FiberArena::new();
        let mut backend = MemoryBackend::new();
        let (first, _) = build_and_commit(&mut arena, &mut backend, None, vec![li("a")]);
        backend.take_mutations();

        let span = Element::native("span", Props::new());
        build_and_commit(&mut arena, &mut backend, Some(first), vec![span]);

        let structural: Vec<_> = backend
            .take_mutations()
            .into_iter()
            .filter(Mutation::is_structural)
            .collect();
        assert!(matches!(structural.first(), Some(Mutation::Remove { .. })));
        assert!(matches!(structural.last(), Some(Mutation::Append { .. })));
        assert_eq!(backend.to_html(), "<span></span>");
    }

    #[test]
    fn middle_replacement_is_anchored_on_surviving_sibling() {
        let mut arena = FiberArena::new();
        let mut backend = MemoryBackend::new();
        let p = || Element::native("p", Props::new());
        let (first, _) = build_and_commit(&mut arena, &mut backend, None, vec![p(), p(), p()]);
        let container = backend.container();
        let old = backend.children(container).to_vec();
        backend.take_mutations();

        let span = Element::native("span", Props::new());
        let (_, report) = build_and_commit(
            &mut arena,
            &mut backend,
            Some(first),
            vec![p(), span, p()],
        );

        let span = backend.find_by_tag("span")[0];
        let structural: Vec<_> = backend
            .take_mutations()
            .into_iter()
            .filter(Mutation::is_structural)
            .collect();
        assert_eq!(
            structural,
            vec![
                Mutation::Remove {
                    parent: container,
                    node: old[1],
                },
                Mutation::Insert {
                    parent: container,
                    node: span,
                    anchor: old[2],
                },
            ]
        );
        assert_eq!(backend.to_html(), "<p></p><span></span><p></p>");
        assert_eq!(backend.children(container), [old[0], span, old[2]]);
        assert_eq!((report.deletions, report.placements), (1, 1));
    }

    #[test]
    fn placement_lands_before_following_survivor() {
        let mut arena = FiberArena::new();
        let mut backend = MemoryBackend::new();
        let p = |text: &str| Element::native("p", Props::new().child(text));

        let (first, _) = build_and_commit(
            &mut arena,
            &mut backend,
            None,
            vec![p("x"), Element::Empty, p("z")],
        );
        assert_eq!(backend.to_html(), "<p>x</p><p>z</p>");

        let (_, report) = build_and_commit(
            &mut arena,
            &mut backend,
            Some(first),
            vec![p("x"), p("y"), p("z")],
        );

        assert_eq!(backend.to_html(), "<p>x</p><p>y</p><p>z</p>");
        // the new paragraph and its text node; the empty slot owned no node
        assert_eq!(report.placements, 2);
        assert_eq!(report.deletions, 0);
    }

    #[test]
    fn unchanged_tree_commits_nothing() {
        let mut arena = FiberArena::new();
        let mut backend = MemoryBackend::new();
        let items = vec![li("a"), li("b")];
        let (first, _) = build_and_commit(&mut arena, &mut backend, None, items.clone());
        backend.take_mutations();

        let (_, report) = build_and_commit(&mut arena, &mut backend, Some(first), items);

        assert!(report.is_noop());
        assert_eq!(report.unchanged, 4);
        assert!(backend.mutations().is_empty());
    }
}
