//! Reconciliation
//!
//! Turns a new element tree into the minimal set of display mutations,
//! in two phases.
//!
//! # Build Phase
//!
//! Interruptible. The work loop walks the work-in-progress tree one fiber
//! at a time, rendering components and reconciling each fiber's children
//! against the previous render (see `diff`). Nothing visible changes, so
//! the loop can stop whenever the host's [`Deadline`] runs short and pick
//! up at the saved position later.
//!
//! # Commit Phase
//!
//! Not interruptible. Once every unit is done, deletions are applied first,
//! then placements and updates depth-first. The work-in-progress tree then
//! becomes the committed tree.
//!
//! # Matching
//!
//! Children are matched by position only. Same position and same type means
//! update in place; anything else is a deletion plus a placement.

mod commit;
mod diff;
mod scheduler;

pub use commit::CommitReport;
pub use scheduler::{Deadline, TimeSlice, Unbounded, UnitBudget, WorkStatus};
