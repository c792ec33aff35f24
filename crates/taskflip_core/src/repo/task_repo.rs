//! Typed persistence contract for the open and done task collections.
//!
//! # Responsibility
//! - Name the two storage keys and the stored collection shape.
//! - Load collections leniently and save both collections together.
//!
//! # Invariants
//! - `load` never fails: absent, unreadable or malformed entries yield an
//!   empty collection.
//! - Saves write a versioned envelope; reads also accept the legacy bare
//!   array written before versioning existed.
//! - Loaded collections are normalized so each id appears once and
//!   `is_completed` matches its collection.
//! - Open is written before done. A crash between the two writes leaves
//!   them out of step; the store offers no transaction to prevent it.

use crate::model::task::{Task, TaskId};
use crate::repo::kv_store::{KeyValueStore, RepoResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Storage key for the open collection.
pub const OPEN_TASKS_KEY: &str = "todoApp_openTasks";
/// Storage key for the done collection.
pub const DONE_TASKS_KEY: &str = "todoApp_doneTasks";
/// Envelope version written by this binary.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    schema_version: u32,
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCollection {
    Versioned(Envelope),
    Unversioned(Vec<Task>),
}

/// Both task collections, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollections {
    pub open: Vec<Task>,
    pub done: Vec<Task>,
}

/// Serializes one collection into the versioned stored shape.
pub fn encode_collection(tasks: &[Task]) -> RepoResult<String> {
    let envelope = EnvelopeRef {
        schema_version: CURRENT_SCHEMA_VERSION,
        tasks,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parses one stored collection, versioned or legacy.
///
/// Envelopes from a newer version are still decoded; unknown fields are
/// ignored so the tasks survive the next save.
pub fn decode_collection(raw: &str) -> RepoResult<Vec<Task>> {
    match serde_json::from_str::<StoredCollection>(raw)? {
        StoredCollection::Versioned(envelope) => {
            if envelope.schema_version > CURRENT_SCHEMA_VERSION {
                warn!(
                    "event=tasks_decode module=repo status=newer_schema schema_version={} supported={}",
                    envelope.schema_version, CURRENT_SCHEMA_VERSION
                );
            }
            Ok(envelope.tasks)
        }
        StoredCollection::Unversioned(tasks) => Ok(tasks),
    }
}

/// Task collections stored through a key-value store.
pub struct TaskCollectionRepository<S> {
    store: S,
}

impl<S: KeyValueStore> TaskCollectionRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads one collection by key, substituting empty on any failure.
    pub fn load(&self, key: &str) -> Vec<Task> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("event=tasks_load module=repo status=absent key={key}");
                return Vec::new();
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=repo status=error key={} error_code=read_failed error={}",
                    key, err
                );
                return Vec::new();
            }
        };

        match decode_collection(&raw) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(
                    "event=tasks_load module=repo status=error key={} error_code=malformed error={}",
                    key, err
                );
                Vec::new()
            }
        }
    }

    /// Loads and normalizes both collections.
    pub fn load_collections(&self) -> TaskCollections {
        let loaded = TaskCollections {
            open: self.load(OPEN_TASKS_KEY),
            done: self.load(DONE_TASKS_KEY),
        };
        normalize_collections(loaded)
    }

    /// Writes both collections, open first.
    ///
    /// # Errors
    /// - Serialization or store write failures. When the open write succeeds
    ///   and the done write fails, the two keys are left out of step.
    pub fn save_collections(&self, open: &[Task], done: &[Task]) -> RepoResult<()> {
        let open_raw = encode_collection(open)?;
        let done_raw = encode_collection(done)?;
        self.store.set(OPEN_TASKS_KEY, &open_raw)?;
        self.store.set(DONE_TASKS_KEY, &done_raw)?;
        Ok(())
    }
}

/// Restores the settled-state invariant on loaded data.
///
/// - A duplicate id keeps its first position (open before done).
/// - `is_completed` is rewritten to match the holding collection.
pub fn normalize_collections(collections: TaskCollections) -> TaskCollections {
    let mut seen: HashSet<TaskId> = HashSet::new();
    let mut dropped = 0_usize;
    let mut flipped = 0_usize;

    let mut keep = |tasks: Vec<Task>, is_completed: bool| -> Vec<Task> {
        tasks
            .into_iter()
            .filter_map(|mut task| {
                if !seen.insert(task.id) {
                    dropped += 1;
                    return None;
                }
                if task.is_completed != is_completed {
                    task.is_completed = is_completed;
                    flipped += 1;
                }
                Some(task)
            })
            .collect()
    };

    let open = keep(collections.open, false);
    let done = keep(collections.done, true);

    if dropped > 0 || flipped > 0 {
        warn!(
            "event=tasks_normalize module=repo status=repaired dropped_duplicates={} fixed_flags={}",
            dropped, flipped
        );
    }

    TaskCollections { open, done }
}

#[cfg(test)]
mod tests {
    use super::{decode_collection, encode_collection, normalize_collections, TaskCollections};
    use crate::model::task::{Task, TaskDraft, TaskId};

    fn task(id: u64, is_completed: bool) -> Task {
        let mut task = Task::from_draft(TaskId::Legacy(id), TaskDraft::new("t", "d", ""));
        task.is_completed = is_completed;
        task
    }

    #[test]
    fn encode_writes_versioned_envelope() {
        let raw = encode_collection(&[task(1, false)]).expect("collection should encode");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("stored value should be json");

        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["tasks"][0]["id"], 1);
        assert_eq!(json["tasks"][0]["isCompleted"], false);
    }

    #[test]
    fn decode_accepts_legacy_bare_array() {
        let raw = r#"[{"id":1700000000000,"title":"Buy milk","description":"groceries","content":"","isCompleted":false}]"#;
        let tasks = decode_collection(raw).expect("collection should decode");

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, TaskId::Legacy(1_700_000_000_000));
        assert_eq!(tasks[0].title, "Buy milk");
    }

    #[test]
    fn decode_accepts_newer_envelope() {
        let raw = r#"{"schemaVersion":7,"tasks":[{"id":3,"title":"a","description":"b","content":"c","isCompleted":true,"priority":"high"}]}"#;
        let tasks = decode_collection(raw).expect("collection should decode");
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_completed);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_collection("{not json").is_err());
        assert!(decode_collection(r#"{"tasks":"nope"}"#).is_err());
    }

    #[test]
    fn normalize_drops_duplicates_and_fixes_flags() {
        let normalized = normalize_collections(TaskCollections {
            open: vec![task(1, true), task(2, false), task(2, false)],
            done: vec![task(1, true), task(3, false)],
        });

        let open_ids: Vec<_> = normalized.open.iter().map(|task| task.id).collect();
        let done_ids: Vec<_> = normalized.done.iter().map(|task| task.id).collect();
        assert_eq!(open_ids, vec![TaskId::Legacy(1), TaskId::Legacy(2)]);
        assert_eq!(done_ids, vec![TaskId::Legacy(3)]);
        assert!(normalized.open.iter().all(|task| !task.is_completed));
        assert!(normalized.done.iter().all(|task| task.is_completed));
    }
}
