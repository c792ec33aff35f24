//! Task lifecycle services.
//!
//! # Responsibility
//! - Own task state (`TaskStore`) and persist every committed change.
//! - Sequence timed moves between collections (`TransitionAnimator`).
//! - Wire both to a host-driven clock (`TaskBoard`).
//!
//! # Invariants
//! - Single-threaded: every operation runs to completion before the next
//!   event or timer callback.

pub mod board;
pub mod scheduler;
pub mod task_store;
pub mod transition;
