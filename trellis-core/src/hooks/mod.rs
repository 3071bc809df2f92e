//! Component State and Re-render Triggers
//!
//! This module holds everything a component needs to own local state and to
//! ask the engine for another render pass.
//!
//! # Concepts
//!
//! ## Updater
//!
//! A cloneable handle to the engine's re-render flag. State mutations call
//! [`Updater::schedule`]; the engine picks the request up when it is idle, or
//! queues it behind an in-flight build.
//!
//! ## Hooks
//!
//! Function components receive a [`Hooks`] context per invocation. The
//! context threads the hook cursor and the previous render's hook list, so
//! there is no shared cursor to corrupt.
//!
//! ## Component state
//!
//! Class components keep a [`ComponentState`] for their whole lifetime and
//! call `set_state` from event handlers.

mod context;
mod state;
mod updater;

pub use context::Hooks;
pub(crate) use context::HookList;
pub use state::{ComponentState, StateCell, StateSetter};
pub use updater::Updater;
