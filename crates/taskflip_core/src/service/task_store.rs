//! Canonical in-memory task state.
//!
//! # Responsibility
//! - Own the open and done collections.
//! - Expose create/update/delete/move and persist after each committed change.
//! - Notify subscribers after every committed change.
//!
//! # Invariants
//! - At rest, each task id appears in exactly one collection and
//!   `is_completed` matches that collection.
//! - Operations on absent ids are silent no-ops and persist nothing.
//! - Persistence failures are logged and absorbed; in-memory state stays
//!   authoritative and no operation reports an error.

use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::repo::kv_store::KeyValueStore;
use crate::repo::task_repo::{TaskCollectionRepository, TaskCollections};
use log::{debug, error, info};

/// Handle returned by `TaskStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// View of both collections handed to subscribers after a commit.
#[derive(Debug, Clone, Copy)]
pub struct StoreChange<'a> {
    /// Name of the committed operation (`create`, `update`, ...).
    pub operation: &'static str,
    pub open: &'a [Task],
    pub done: &'a [Task],
}

/// Collection sizes, as shown in the board header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub open: usize,
    pub done: usize,
    pub total: usize,
}

type StoreObserver = Box<dyn FnMut(&StoreChange<'_>)>;

/// Owner of the open and done task collections.
pub struct TaskStore<S: KeyValueStore> {
    repo: TaskCollectionRepository<S>,
    open: Vec<Task>,
    done: Vec<Task>,
    observers: Vec<(SubscriptionId, StoreObserver)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Restores collections from `store`; unreadable data loads as empty.
    pub fn load(store: S) -> Self {
        let repo = TaskCollectionRepository::new(store);
        let TaskCollections { open, done } = repo.load_collections();
        info!(
            "event=tasks_restore module=store status=ok open={} done={}",
            open.len(),
            done.len()
        );
        Self {
            repo,
            open,
            done,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn open_tasks(&self) -> &[Task] {
        &self.open
    }

    pub fn done_tasks(&self) -> &[Task] {
        &self.done
    }

    /// Clones both collections.
    pub fn collections(&self) -> TaskCollections {
        TaskCollections {
            open: self.open.clone(),
            done: self.done.clone(),
        }
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts {
            open: self.open.len(),
            done: self.done.len(),
            total: self.open.len() + self.done.len(),
        }
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.open
            .iter()
            .chain(self.done.iter())
            .find(|task| task.id == id)
    }

    /// Returns `Some(is_completed)` of the collection holding `id`.
    pub fn location_of(&self, id: TaskId) -> Option<bool> {
        if self.open.iter().any(|task| task.id == id) {
            Some(false)
        } else if self.done.iter().any(|task| task.id == id) {
            Some(true)
        } else {
            None
        }
    }

    /// Appends a new open task built from `draft`.
    ///
    /// The draft is assumed valid; see `TaskDraft::validate`.
    pub fn create(&mut self, draft: TaskDraft) -> TaskId {
        let id = TaskId::generate();
        self.open.push(Task::from_draft(id, draft));
        self.commit("create");
        id
    }

    /// Applies `patch` to the task wherever it currently lives.
    ///
    /// A patch that flips `is_completed` moves the task to the end of the
    /// matching collection. Returns `false` when `id` is absent.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> bool {
        let Some(from_completed) = self.location_of(id) else {
            debug!("event=task_update module=store status=skip reason=absent id={id}");
            return false;
        };

        let relocates = patch
            .is_completed
            .is_some_and(|is_completed| is_completed != from_completed);
        let origin = self.collection_mut(from_completed);
        let Some(index) = position_of(origin, id) else {
            return false;
        };

        if relocates {
            let mut task = origin.remove(index);
            patch.apply_to(&mut task);
            self.collection_mut(task.is_completed).push(task);
        } else {
            patch.apply_to(&mut origin[index]);
        }

        self.commit("update");
        true
    }

    /// Removes `id` from the open (`false`) or done (`true`) collection.
    ///
    /// Returns `false` when the id is not in that collection.
    pub fn delete(&mut self, id: TaskId, from_completed: bool) -> bool {
        let collection = self.collection_mut(from_completed);
        let Some(index) = position_of(collection, id) else {
            debug!(
                "event=task_delete module=store status=skip reason=absent id={} from_completed={}",
                id, from_completed
            );
            return false;
        };
        collection.remove(index);
        self.commit("delete");
        true
    }

    /// Moves `id` to the opposite collection, flipping `is_completed`.
    ///
    /// Only the transition animator calls this, when an exit phase settles.
    /// A task already gone from its origin is silently dropped.
    pub(crate) fn move_to_opposite(&mut self, id: TaskId, from_completed: bool) -> bool {
        let origin = self.collection_mut(from_completed);
        let Some(index) = position_of(origin, id) else {
            debug!(
                "event=task_move module=store status=skip reason=absent id={} from_completed={}",
                id, from_completed
            );
            return false;
        };
        let mut task = origin.remove(index);
        task.is_completed = !from_completed;
        self.collection_mut(!from_completed).push(task);
        self.commit("move");
        true
    }

    /// Registers an observer called after every committed mutation.
    ///
    /// Observers receive the collections directly and must not call back
    /// into the store.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&StoreChange<'_>) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn collection_mut(&mut self, is_completed: bool) -> &mut Vec<Task> {
        if is_completed {
            &mut self.done
        } else {
            &mut self.open
        }
    }

    fn commit(&mut self, operation: &'static str) {
        match self.repo.save_collections(&self.open, &self.done) {
            Ok(()) => debug!(
                "event=tasks_persist module=store status=ok op={} open={} done={}",
                operation,
                self.open.len(),
                self.done.len()
            ),
            Err(err) => error!(
                "event=tasks_persist module=store status=error op={} error_code=write_failed error={}",
                operation, err
            ),
        }

        let change = StoreChange {
            operation,
            open: &self.open,
            done: &self.done,
        };
        for (_, observer) in &mut self.observers {
            observer(&change);
        }
    }
}

fn position_of(tasks: &[Task], id: TaskId) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}
