//! Board wiring for presentation hosts.
//!
//! # Responsibility
//! - Assemble store, virtual clock and animator over one key-value store.
//! - Forward user intents (create, edit, delete, toggle) and host ticks.
//! - Publish a fresh `BoardSnapshot` to re-render subscribers.
//!
//! # Invariants
//! - All parts share one thread; the host advances time with `advance`.
//! - Subscribers run only after the store borrow is released, so they may
//!   read the board or issue further intents.
//! - Changes made while subscribers run are coalesced into one more round.

use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::repo::kv_store::KeyValueStore;
use crate::service::scheduler::{ManualScheduler, Scheduler};
use crate::service::task_store::{SubscriptionId, TaskCounts, TaskStore};
use crate::service::transition::{
    ToggleOutcome, TransitionAnimator, TransitionState, TransitionTiming,
};
use log::trace;
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Everything a list renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub open: Vec<Task>,
    pub done: Vec<Task>,
    pub transition: TransitionState,
    pub counts: TaskCounts,
}

type BoardObserver = Box<dyn FnMut(&BoardSnapshot)>;

#[derive(Default)]
struct Subscribers {
    entries: RefCell<Vec<(SubscriptionId, BoardObserver)>>,
    removed_while_notifying: RefCell<Vec<SubscriptionId>>,
    next_id: Cell<u64>,
    notifying: Cell<bool>,
}

/// Task store plus transition animator driven by a host clock.
pub struct TaskBoard<S: KeyValueStore + 'static> {
    store: Rc<RefCell<TaskStore<S>>>,
    scheduler: Rc<ManualScheduler>,
    animator: TransitionAnimator<S>,
    dirty: Rc<Cell<bool>>,
    subscribers: Subscribers,
}

impl<S: KeyValueStore + 'static> TaskBoard<S> {
    /// Restores a board from `store` with default timing.
    pub fn load(store: S) -> Self {
        Self::with_timing(store, TransitionTiming::default())
    }

    pub fn with_timing(store: S, timing: TransitionTiming) -> Self {
        let store = Rc::new(RefCell::new(TaskStore::load(store)));
        let scheduler = Rc::new(ManualScheduler::new());
        let animator = TransitionAnimator::new(
            Rc::clone(&store),
            Rc::clone(&scheduler) as Rc<dyn Scheduler>,
            timing,
        );

        let dirty = Rc::new(Cell::new(false));
        let store_dirty = Rc::clone(&dirty);
        store
            .borrow_mut()
            .subscribe(move |_| store_dirty.set(true));
        let animator_dirty = Rc::clone(&dirty);
        animator.on_state_change(move |_| animator_dirty.set(true));

        Self {
            store,
            scheduler,
            animator,
            dirty,
            subscribers: Subscribers::default(),
        }
    }

    /// Borrows the store for reads. Release before calling mutators.
    pub fn store(&self) -> Ref<'_, TaskStore<S>> {
        self.store.borrow()
    }

    pub fn animator(&self) -> &TransitionAnimator<S> {
        &self.animator
    }

    pub fn clock(&self) -> &ManualScheduler {
        &self.scheduler
    }

    pub fn create(&self, draft: TaskDraft) -> TaskId {
        let id = self.store.borrow_mut().create(draft);
        self.publish();
        id
    }

    pub fn update(&self, id: TaskId, patch: TaskPatch) -> bool {
        let applied = self.store.borrow_mut().update(id, patch);
        self.publish();
        applied
    }

    pub fn delete(&self, id: TaskId, from_completed: bool) -> bool {
        let removed = self.store.borrow_mut().delete(id, from_completed);
        self.publish();
        removed
    }

    pub fn toggle(&self, id: TaskId) -> ToggleOutcome {
        let outcome = self.animator.toggle(id);
        self.publish();
        outcome
    }

    /// Advances the board clock, firing any due transition steps.
    ///
    /// Subscribers hear one snapshot per round of changes, after all due
    /// steps have run.
    pub fn advance(&self, elapsed: Duration) -> usize {
        let fired = self.scheduler.advance(elapsed);
        self.publish();
        fired
    }

    pub fn transition(&self) -> TransitionState {
        self.animator.state()
    }

    /// Registers a re-render callback, called with a snapshot after every
    /// intent or tick that changed tasks or transition state.
    ///
    /// The callback may read the board and issue further intents.
    pub fn subscribe(&self, observer: impl FnMut(&BoardSnapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.subscribers.next_id.get());
        self.subscribers.next_id.set(id.0 + 1);
        self.subscribers
            .entries
            .borrow_mut()
            .push((id, Box::new(observer)));
        id
    }

    /// Removes a re-render callback. Returns `false` for unknown handles.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.subscribers.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        if entries.len() != before {
            return true;
        }
        if self.subscribers.notifying.get() {
            self.subscribers
                .removed_while_notifying
                .borrow_mut()
                .push(id);
            return true;
        }
        false
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let store = self.store.borrow();
        BoardSnapshot {
            open: store.open_tasks().to_vec(),
            done: store.done_tasks().to_vec(),
            transition: self.animator.state(),
            counts: store.counts(),
        }
    }

    fn publish(&self) {
        if self.subscribers.notifying.replace(true) {
            return;
        }

        while self.dirty.replace(false) {
            let snapshot = self.snapshot();
            let mut observers = std::mem::take(&mut *self.subscribers.entries.borrow_mut());
            trace!(
                "event=board_publish module=board status=ok subscribers={} open={} done={}",
                observers.len(),
                snapshot.counts.open,
                snapshot.counts.done
            );
            for (_, observer) in observers.iter_mut() {
                observer(&snapshot);
            }

            let removed = std::mem::take(&mut *self.subscribers.removed_while_notifying.borrow_mut());
            observers.retain(|(id, _)| !removed.contains(id));
            let mut entries = self.subscribers.entries.borrow_mut();
            let added = std::mem::replace(&mut *entries, observers);
            entries.extend(added);
        }
        self.subscribers.notifying.set(false);
    }
}
