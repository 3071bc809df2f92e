//! Engine
//!
//! The [`Engine`] owns everything one mounted root needs: the display
//! backend, the fiber arena with the committed and in-progress trees, and
//! the [`Updater`] shared with every component it renders.
//!
//! # Driving
//!
//! The engine never runs on its own. A host calls [`Engine::work_loop`]
//! whenever it has time to spare, or uses one of the drivers:
//!
//! - [`Engine::flush`] runs everything scheduled, synchronously.
//! - [`Engine::run_until_idle`] does the same in time slices, yielding to
//!   the tokio runtime between them.
//! - [`Engine::run`] keeps going forever, sleeping until a component
//!   schedules a re-render.
//!
//! # Requests While Busy
//!
//! A render request that arrives while a build is in flight is queued and
//! started right after that build commits. Requests never interrupt a
//! build, and a finished build is never thrown away.

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::EngineConfig;
use crate::element::Element;
use crate::error::RenderError;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};
use crate::hooks::Updater;
use crate::reconcile::{CommitReport, TimeSlice, Unbounded, WorkStatus};

/// Incremental renderer for one root.
pub struct Engine<B: Backend> {
    pub(crate) config: EngineConfig,
    pub(crate) backend: B,
    pub(crate) arena: FiberArena<B::Node>,

    /// Display node everything is rendered into.
    pub(crate) container: Option<B::Node>,

    /// Root element used when no committed tree exists yet.
    pub(crate) root_element: Element,

    /// Last committed tree.
    pub(crate) current: Option<FiberId>,

    /// Tree under construction.
    pub(crate) wip: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,

    /// The last build stopped on an error.
    pub(crate) failed: bool,

    /// New root element requested while a build was in flight.
    pub(crate) queued_root: Option<Element>,

    pub(crate) updater: Updater,

    pub(crate) units_performed: u64,
    pub(crate) commits: u64,
}

impl<B: Backend> Engine<B> {
    /// Create an engine with the default configuration. Nothing is mounted.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    /// Create an engine with the given configuration.
    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        Self {
            config,
            backend,
            arena: FiberArena::new(),
            container: None,
            root_element: Element::Empty,
            current: None,
            wip: None,
            next_unit: None,
            deletions: Vec::new(),
            failed: false,
            queued_root: None,
            updater: Updater::new(),
            units_performed: 0,
            commits: 0,
        }
    }

    /// Mount `element` into `container`. Nothing is built until the work
    /// loop runs.
    pub fn begin_render(&mut self, element: Element, container: B::Node) -> Result<(), RenderError> {
        if self.container.is_some() {
            return Err(RenderError::AlreadyMounted);
        }
        debug!(element = %element.describe(), ?container, "mounting root");
        self.container = Some(container);
        self.seed(Some(root_of(element)));
        Ok(())
    }

    /// Replace the top-level element of the mounted root.
    pub fn render(&mut self, element: Element) -> Result<(), RenderError> {
        if self.container.is_none() {
            return Err(RenderError::NotMounted);
        }
        let root = root_of(element);
        if self.is_building() {
            debug!("build in flight; queueing new root element");
            self.queued_root = Some(root);
        } else {
            self.seed(Some(root));
        }
        Ok(())
    }

    /// Rebuild the whole tree from the committed root, so that component
    /// state changes are picked up.
    pub fn request_rerender(&mut self) -> Result<(), RenderError> {
        if self.container.is_none() {
            return Err(RenderError::NotMounted);
        }
        if self.is_building() {
            debug!("build in flight; queueing re-render");
            self.updater.schedule();
        } else {
            self.updater.take();
            self.seed(None);
        }
        Ok(())
    }

    /// Run the work loop without a deadline until nothing is scheduled.
    /// Returns one report per commit.
    pub fn flush(&mut self) -> Result<Vec<CommitReport>, RenderError> {
        let mut reports = Vec::new();
        loop {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Committed(report) => {
                    reports.push(report);
                    self.check_passes(reports.len())?;
                }
                WorkStatus::Yielded => {}
                WorkStatus::Idle => return Ok(reports),
            }
        }
    }

    /// Like [`flush`](Self::flush), but in slices of
    /// [`EngineConfig::slice_budget`], yielding to the runtime between them.
    pub async fn run_until_idle(&mut self) -> Result<Vec<CommitReport>, RenderError> {
        let mut reports = Vec::new();
        loop {
            let slice = TimeSlice::new(self.config.slice_budget());
            match self.work_loop(&slice)? {
                WorkStatus::Committed(report) => {
                    reports.push(report);
                    self.check_passes(reports.len())?;
                    tokio::task::yield_now().await;
                }
                WorkStatus::Yielded => tokio::task::yield_now().await,
                WorkStatus::Idle => return Ok(reports),
            }
        }
    }

    /// Render whenever a re-render is scheduled. Only returns on error.
    pub async fn run(&mut self) -> Result<(), RenderError> {
        loop {
            self.run_until_idle().await?;
            self.updater.notified().await;
        }
    }

    fn check_passes(&self, passes: usize) -> Result<(), RenderError> {
        if passes >= self.config.max_passes && self.has_pending_work() {
            warn!(passes, "component keeps scheduling re-renders");
            return Err(RenderError::RenderLoop { passes });
        }
        Ok(())
    }

    /// Start a new work-in-progress root aliasing `current`. With no
    /// element, the committed root element is rendered again.
    pub(crate) fn seed(&mut self, element: Option<Element>) {
        self.discard_work_in_progress();

        let Some(container) = self.container.clone() else {
            return;
        };
        let element = element.unwrap_or_else(|| {
            self.current
                .and_then(|id| self.arena.get(id))
                .map(|fiber| fiber.element.clone())
                .unwrap_or_else(|| self.root_element.clone())
        });
        self.root_element = element.clone();

        let mut root = Fiber::new(element, None);
        root.state_node = Some(container);
        root.alternate = self.current;
        let id = self.arena.insert(root);

        self.wip = Some(id);
        self.next_unit = Some(id);
        debug!(root = ?id, alternate = ?self.current, "started render pass");
    }

    /// Drop a failed or superseded work-in-progress tree.
    fn discard_work_in_progress(&mut self) {
        for id in self.deletions.drain(..) {
            if let Some(fiber) = self.arena.get_mut(id) {
                fiber.effect = EffectTag::None;
            }
        }
        if let Some(root) = self.wip.take() {
            let freed = self.arena.release(root);
            debug!(freed, "discarded work-in-progress tree");
        }
        self.next_unit = None;
        self.failed = false;
    }

    /// Whether a build is in flight (started and not failed).
    pub fn is_building(&self) -> bool {
        self.wip.is_some() && !self.failed
    }

    /// Whether a build is in flight or a re-render is waiting.
    pub fn has_pending_work(&self) -> bool {
        self.is_building() || self.queued_root.is_some() || self.updater.is_pending()
    }

    /// Get a reference to the display backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a mutable reference to the display backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle components use to schedule re-renders of this engine.
    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    /// Fiber storage holding the committed and in-progress trees.
    pub fn arena(&self) -> &FiberArena<B::Node> {
        &self.arena
    }

    /// Root of the committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current
    }

    /// Root of the tree under construction.
    pub fn work_in_progress(&self) -> Option<FiberId> {
        self.wip
    }

    /// The fiber the work loop will process next.
    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Total units of work performed.
    pub fn units_performed(&self) -> u64 {
        self.units_performed
    }

    /// Total commits applied.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

impl<B: Backend + Default> Default for Engine<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: Backend> std::fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("current", &self.current)
            .field("wip", &self.wip)
            .field("next_unit", &self.next_unit)
            .field("failed", &self.failed)
            .field("fibers", &self.arena.len())
            .field("commits", &self.commits)
            .finish()
    }
}

/// The root fiber renders its single element as a one-item list.
fn root_of(element: Element) -> Element {
    Element::list([element])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::element::Props;
    use crate::reconcile::UnitBudget;

    fn engine() -> Engine<MemoryBackend> {
        Engine::new(MemoryBackend::new())
    }

    fn mount(engine: &mut Engine<MemoryBackend>, element: Element) {
        let container = engine.backend().container();
        engine.begin_render(element, container).unwrap();
    }

    #[test]
    fn nothing_happens_before_the_work_loop_runs() {
        let mut engine = engine();
        mount(&mut engine, Element::native("div", Props::new()));

        assert!(engine.is_building());
        assert_eq!(engine.backend().to_html(), "");
        assert!(engine.current_root().is_none());
    }

    #[test]
    fn second_mount_is_rejected() {
        let mut engine = engine();
        mount(&mut engine, Element::text("a"));
        let container = engine.backend().container();

        let err = engine.begin_render(Element::text("b"), container).unwrap_err();
        assert!(matches!(err, RenderError::AlreadyMounted));
    }

    #[test]
    fn rerender_requires_a_mounted_root() {
        let mut engine = engine();
        assert!(matches!(engine.request_rerender(), Err(RenderError::NotMounted)));
        assert!(matches!(engine.render(Element::Empty), Err(RenderError::NotMounted)));
    }

    #[test]
    fn commit_promotes_work_in_progress_and_frees_old_tree() {
        let mut engine = engine();
        mount(&mut engine, Element::native("p", Props::new().child("hi")));
        engine.flush().unwrap();

        let first = engine.current_root().unwrap();
        // root, p, text
        assert_eq!(engine.arena().len(), 3);

        engine.request_rerender().unwrap();
        engine.flush().unwrap();

        assert!(!engine.arena().contains(first));
        assert_eq!(engine.arena().len(), 3);
        assert!(engine.work_in_progress().is_none());
        assert_eq!(engine.commits(), 2);
    }

    #[test]
    fn render_while_building_is_queued() {
        let mut engine = engine();
        mount(&mut engine, Element::native("p", Props::new().child("one")));

        assert_eq!(engine.work_loop(&UnitBudget::new(1)).unwrap(), WorkStatus::Yielded);
        engine.render(Element::native("p", Props::new().child("two"))).unwrap();

        let reports = engine.flush().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(engine.backend().to_html(), "<p>two</p>");
    }
}
