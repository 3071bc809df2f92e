//! Trellis Core
//!
//! An incremental UI reconciliation engine. Applications describe the UI
//! they want as an immutable [`Element`] tree; the engine diffs it against
//! what it rendered last time and applies the minimal set of mutations to
//! a display [`Backend`].
//!
//! It implements:
//!
//! - Class and function components with local state
//! - Positional child reconciliation with effect tagging
//! - A resumable build phase driven by a host deadline
//! - A two-pass commit (deletions, then insertions and updates)
//!
//! # Architecture
//!
//! - `element`: element model, props and component types
//! - `hooks`: component state and re-render requests
//! - `fiber`: the arena holding the committed and in-progress trees
//! - `reconcile`: work loop, child diffing and commit
//! - `backend`: the display backend trait and an in-memory implementation
//! - `engine`: the entry points tying it all together
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::{Element, Engine, FunctionType, MemoryBackend, Props};
//!
//! let counter = FunctionType::new("Counter", |hooks, _props| {
//!     let (count, set_count) = hooks.use_state(0)?;
//!     Ok(Element::native(
//!         "button",
//!         Props::new()
//!             .on("click", move |_| set_count.update(|n| n + 1))
//!             .child(count),
//!     ))
//! });
//!
//! let mut engine = Engine::new(MemoryBackend::new());
//! let container = engine.backend().container();
//! engine.begin_render(Element::function(&counter, Props::new()), container)?;
//! engine.flush()?;
//! // <button>0</button>
//! ```

pub mod backend;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod reconcile;

pub use backend::{Backend, MemoryBackend};
pub use config::{EngineConfig, FlattenPolicy};
pub use element::{Component, Element, FunctionType, ClassType, Props};
pub use engine::Engine;
pub use error::{BackendError, RenderError, RenderResult};
pub use hooks::{ComponentState, Hooks, Updater};
pub use reconcile::{CommitReport, Deadline, TimeSlice, Unbounded, UnitBudget, WorkStatus};
