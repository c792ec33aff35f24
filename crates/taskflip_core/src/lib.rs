//! Core task lifecycle logic for Taskflip.
//! This crate is the single source of truth for task invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{DraftValidationError, Task, TaskDraft, TaskId, TaskIdParseError, TaskPatch};
pub use repo::kv_store::{
    KeyValueStore, MemoryKeyValueStore, RepoError, RepoResult, SqliteKeyValueStore,
};
pub use repo::task_repo::{
    TaskCollectionRepository, TaskCollections, CURRENT_SCHEMA_VERSION, DONE_TASKS_KEY,
    OPEN_TASKS_KEY,
};
pub use service::board::{BoardSnapshot, TaskBoard};
pub use service::scheduler::{ManualScheduler, Scheduler, TimerCallback};
pub use service::task_store::{StoreChange, SubscriptionId, TaskCounts, TaskStore};
pub use service::transition::{
    ItemPhase, ToggleOutcome, TransitionAnimator, TransitionState, TransitionTiming,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
