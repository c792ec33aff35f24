//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by the store, the animator and
//!   the persistence contract.
//! - Provide the draft/patch shapes exchanged with create and edit forms.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - `is_completed` mirrors the collection that holds the task.

pub mod task;
