//! Work Loop
//!
//! The build phase is split into units of work, one per fiber. The loop
//! performs units until the host's deadline runs short, then hands control
//! back with the position saved in `next_unit`. When no unit is left the
//! finished tree is committed in one go.
//!
//! # Algorithm
//!
//! For each unit:
//!
//! 1. Host fibers without a display node get one from the backend.
//! 2. The fiber's child input is produced: native children and list items
//!    as written, or the output of rendering a component.
//! 3. The input is flattened and reconciled against the previous children.
//! 4. The next unit is the first child, else the nearest sibling up the
//!    parent chain.
//!
//! At least one unit runs per call, so a stingy deadline slows a build down
//! but never stalls it.

use std::cell::Cell;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use super::commit::{commit_root, CommitReport};
use super::diff::reconcile_children;
use crate::backend::Backend;
use crate::element::{flatten_children, ClassType, ComponentType, Element, FunctionType, Props};
use crate::engine::Engine;
use crate::error::RenderError;
use crate::fiber::FiberId;
use crate::hooks::{HookList, Hooks};

/// Reports how much time the host is willing to give the work loop.
pub trait Deadline {
    /// Time left in the current slice. Queried after every unit.
    fn time_remaining(&self) -> Duration;
}

/// Deadline backed by the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    end: Instant,
}

impl TimeSlice {
    /// A slice ending `budget` from now.
    pub fn new(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }

    /// A slice ending at a fixed instant.
    pub fn until(end: Instant) -> Self {
        Self { end }
    }
}

impl Deadline for TimeSlice {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// Deadline that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Deadline that allows a fixed number of units, regardless of time.
///
/// Useful for deterministic tests of yield and resume.
#[derive(Debug)]
pub struct UnitBudget {
    remaining: Cell<usize>,
}

impl UnitBudget {
    /// Allow `units` units of work per slice.
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}

/// Outcome of one work loop call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was scheduled.
    Idle,
    /// The deadline ran short; call again to resume.
    Yielded,
    /// The build finished and was committed.
    Committed(CommitReport),
}

impl<B: Backend> Engine<B> {
    /// Perform units of work until the deadline runs short or the build
    /// finishes. A finished build is committed before returning.
    ///
    /// A pending re-render is picked up when no build is in flight. When a
    /// unit fails, the partial work-in-progress tree is kept until the next
    /// request replaces it and the committed tree is left untouched. When
    /// the backend fails during commit, the new tree is still promoted,
    /// since the display has already changed, and the error is returned.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
        if self.next_unit.is_none() && !self.start_pending() {
            return Ok(WorkStatus::Idle);
        }

        let threshold = self.config.yield_threshold();
        let mut units = 0usize;
        while let Some(unit) = self.next_unit {
            match self.perform_unit(unit) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    debug!(fiber = ?unit, error = %err, "unit of work failed");
                    self.next_unit = None;
                    self.failed = true;
                    return Err(err);
                }
            }
            units += 1;
            self.units_performed += 1;
            if deadline.time_remaining() < threshold {
                break;
            }
        }

        if self.next_unit.is_some() {
            trace!(units, "yielding to host");
            return Ok(WorkStatus::Yielded);
        }

        debug!(units, "build phase complete");
        self.commit().map(WorkStatus::Committed)
    }

    /// Start queued work if nothing is in flight. Returns whether a build is
    /// now ready to run.
    fn start_pending(&mut self) -> bool {
        if self.wip.is_some() && !self.failed {
            // built but not yet committed
            return true;
        }
        if let Some(element) = self.queued_root.take() {
            self.seed(Some(element));
            return true;
        }
        if self.updater.take() && self.container.is_some() {
            self.seed(None);
            return true;
        }
        false
    }

    fn commit(&mut self) -> Result<CommitReport, RenderError> {
        let Some(root) = self.wip else {
            return Ok(CommitReport::default());
        };

        let result = commit_root(&self.arena, &mut self.backend, root, &self.deletions);
        if let Err(err) = &result {
            warn!(error = %err, "commit applied with backend errors");
        }

        // promoted even on failure: the deletions and placements are on screen
        // deleted fibers belong to the old tree and go with it
        self.deletions.clear();
        self.wip = None;
        if let Some(previous) = self.current.replace(root) {
            let freed = self.arena.release(previous);
            trace!(freed, "released previous tree");
        }
        self.commits += 1;

        if self.queued_root.is_some() || self.updater.is_pending() {
            self.start_pending();
        }
        result
    }

    fn perform_unit(&mut self, id: FiberId) -> Result<Option<FiberId>, RenderError> {
        let Some(fiber) = self.arena.get(id) else {
            return Ok(None);
        };
        let element = fiber.element.clone();
        let alternate = fiber.alternate;
        let needs_node = fiber.is_host() && fiber.state_node.is_none();

        if needs_node {
            validate(&element)?;
            let node = self.backend.create_node(&element)?;
            if let Some(fiber) = self.arena.get_mut(id) {
                fiber.state_node = node;
            }
        }

        let children = match &element {
            Element::Component(component) => {
                let rendered = match &component.component {
                    ComponentType::Class(class) => {
                        self.render_class(id, alternate, class, &component.props)?
                    }
                    ComponentType::Function(function) => {
                        self.render_function(id, alternate, function, &component.props)?
                    }
                };
                flatten_children(std::slice::from_ref(&rendered), self.config.flatten, &element)?
            }
            _ => flatten_children(element.child_input(), self.config.flatten, &element)?,
        };

        let summary = reconcile_children(&mut self.arena, id, children, &mut self.deletions);
        if self.config.log_units {
            trace!(
                fiber = ?id,
                element = %element.describe(),
                updates = summary.updates,
                placements = summary.placements,
                deletions = summary.deletions,
                "performed unit"
            );
        }
        Ok(self.arena.next_unit(id))
    }

    fn render_class(
        &mut self,
        id: FiberId,
        alternate: Option<FiberId>,
        class: &ClassType,
        props: &Props,
    ) -> Result<Element, RenderError> {
        let previous = alternate
            .and_then(|alternate| self.arena.get(alternate))
            .and_then(|fiber| fiber.instance.clone());

        let instance = match previous {
            Some(instance) => {
                instance.lock().receive_props(props);
                instance
            }
            None => {
                debug!(component = class.name(), "creating component instance");
                class.instantiate(props, self.updater.clone())
            }
        };

        let rendered = instance.lock().render(props);
        if let Some(fiber) = self.arena.get_mut(id) {
            fiber.instance = Some(instance);
        }
        rendered
    }

    fn render_function(
        &mut self,
        id: FiberId,
        alternate: Option<FiberId>,
        function: &FunctionType,
        props: &Props,
    ) -> Result<Element, RenderError> {
        let previous: HookList = alternate
            .and_then(|alternate| self.arena.get(alternate))
            .map(|fiber| fiber.hooks.clone())
            .unwrap_or_default();

        let mut hooks = Hooks::new(function.name(), &previous, &self.updater);
        let rendered = function.call(&mut hooks, props)?;
        let slots = hooks.into_slots();

        if let Some(fiber) = self.arena.get_mut(id) {
            fiber.hooks = slots;
        }
        Ok(rendered)
    }
}

/// Reject elements no backend could render.
fn validate(element: &Element) -> Result<(), RenderError> {
    if let Element::Native(native) = element {
        let tag = native.tag.as_str();
        if tag.is_empty() || tag.starts_with('#') || tag.chars().any(char::is_whitespace) {
            return Err(RenderError::MalformedElement(format!(
                "{tag:?} is not a valid native tag"
            )));
        }
    }
    Ok(())
}
