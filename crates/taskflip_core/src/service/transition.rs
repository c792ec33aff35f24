//! Timed move of one task between collections.
//!
//! # Responsibility
//! - Sequence `Idle -> Exiting -> Entering -> Idle` for a toggled task.
//! - Commit the collection move exactly once, when the exit phase ends.
//! - Expose per-item phase so presentation can pick exit/enter styling.
//!
//! # Invariants
//! - At most one task is in flight; toggles while not `Idle` are ignored.
//! - The task stays in its origin collection for the whole exit phase.
//! - Pending timers hold weak references only. Dropping the animator turns
//!   them into no-ops and the task stays where it was.

use crate::model::task::TaskId;
use crate::repo::kv_store::KeyValueStore;
use crate::service::scheduler::Scheduler;
use crate::service::task_store::TaskStore;
use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Default exit phase length.
pub const DEFAULT_EXIT_DURATION: Duration = Duration::from_millis(240);
/// Extra time the enter phase runs past the exit length.
pub const ENTER_GRACE: Duration = Duration::from_millis(80);

/// Phase lengths of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTiming {
    /// From toggle until the collection move.
    pub exit: Duration,
    /// From the collection move until back to `Idle`.
    pub enter: Duration,
}

impl TransitionTiming {
    pub fn total(&self) -> Duration {
        self.exit + self.enter
    }
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            exit: DEFAULT_EXIT_DURATION,
            enter: DEFAULT_EXIT_DURATION + ENTER_GRACE,
        }
    }
}

/// Animator state, read by presentation to style items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    /// Task still in its origin collection, styled as leaving.
    Exiting(TaskId),
    /// Task already in its destination collection, styled as arriving.
    Entering(TaskId),
}

impl TransitionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::Idle => None,
            Self::Exiting(id) | Self::Entering(id) => Some(*id),
        }
    }
}

/// Per-item presentation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    Settled,
    Exiting,
    Entering,
}

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Exit phase started.
    Started,
    /// Another task is in flight; request ignored.
    Busy,
    /// No collection holds the id; request ignored.
    UnknownTask,
}

type StateObserver = Box<dyn FnMut(TransitionState)>;

#[derive(Default)]
struct AnimatorShared {
    state: Cell<TransitionState>,
    observers: RefCell<Vec<StateObserver>>,
    queued: RefCell<VecDeque<TransitionState>>,
    notifying: Cell<bool>,
}

impl AnimatorShared {
    /// Records `next` and notifies observers in change order.
    ///
    /// Changes made by an observer (a toggle, say) are queued and delivered
    /// once the current round finishes.
    fn set_state(&self, next: TransitionState) {
        self.state.set(next);
        self.queued.borrow_mut().push_back(next);
        if self.notifying.replace(true) {
            return;
        }

        loop {
            let Some(state) = self.queued.borrow_mut().pop_front() else {
                break;
            };
            let mut observers = std::mem::take(&mut *self.observers.borrow_mut());
            for observer in observers.iter_mut() {
                observer(state);
            }
            let mut slot = self.observers.borrow_mut();
            let added = std::mem::replace(&mut *slot, observers);
            slot.extend(added);
        }
        self.notifying.set(false);
    }
}

/// Single-slot transition state machine over a shared task store.
pub struct TransitionAnimator<S: KeyValueStore + 'static> {
    store: Rc<RefCell<TaskStore<S>>>,
    scheduler: Rc<dyn Scheduler>,
    timing: TransitionTiming,
    shared: Rc<AnimatorShared>,
}

impl<S: KeyValueStore + 'static> TransitionAnimator<S> {
    pub fn new(
        store: Rc<RefCell<TaskStore<S>>>,
        scheduler: Rc<dyn Scheduler>,
        timing: TransitionTiming,
    ) -> Self {
        Self {
            store,
            scheduler,
            timing,
            shared: Rc::new(AnimatorShared::default()),
        }
    }

    pub fn state(&self) -> TransitionState {
        self.shared.state.get()
    }

    pub fn timing(&self) -> TransitionTiming {
        self.timing
    }

    /// Whether a toggle would currently be accepted.
    pub fn toggles_enabled(&self) -> bool {
        self.state().is_idle()
    }

    pub fn phase_of(&self, id: TaskId) -> ItemPhase {
        match self.state() {
            TransitionState::Exiting(active) if active == id => ItemPhase::Exiting,
            TransitionState::Entering(active) if active == id => ItemPhase::Entering,
            _ => ItemPhase::Settled,
        }
    }

    /// Registers an observer called on every state change.
    ///
    /// Observers may call back into the animator; an observer added during
    /// a notification first hears the next change.
    pub fn on_state_change(&self, observer: impl FnMut(TransitionState) + 'static) {
        self.shared.observers.borrow_mut().push(Box::new(observer));
    }

    /// Starts moving `id` to the opposite collection.
    ///
    /// Ignored while any transition is in flight or when no collection holds
    /// `id`. On `Started`, the move commits after `timing.exit` and the
    /// animator returns to `Idle` after a further `timing.enter`.
    pub fn toggle(&self, id: TaskId) -> ToggleOutcome {
        let current = self.state();
        if !current.is_idle() {
            debug!(
                "event=task_toggle module=animator status=skip reason=busy id={} in_flight={:?}",
                id,
                current.task_id()
            );
            return ToggleOutcome::Busy;
        }

        let Some(from_completed) = self.store.borrow().location_of(id) else {
            debug!("event=task_toggle module=animator status=skip reason=absent id={id}");
            return ToggleOutcome::UnknownTask;
        };

        info!(
            "event=task_toggle module=animator status=start id={} from_completed={}",
            id, from_completed
        );
        self.shared.set_state(TransitionState::Exiting(id));

        let shared = Rc::downgrade(&self.shared);
        let store = Rc::downgrade(&self.store);
        let scheduler = Rc::downgrade(&self.scheduler);
        let enter = self.timing.enter;
        self.scheduler.after(
            self.timing.exit,
            Box::new(move || settle_exit(id, from_completed, enter, shared, store, scheduler)),
        );
        ToggleOutcome::Started
    }
}

fn settle_exit<S: KeyValueStore + 'static>(
    id: TaskId,
    from_completed: bool,
    enter: Duration,
    shared: Weak<AnimatorShared>,
    store: Weak<RefCell<TaskStore<S>>>,
    scheduler: Weak<dyn Scheduler>,
) {
    let (Some(shared), Some(store)) = (shared.upgrade(), store.upgrade()) else {
        debug!("event=task_toggle module=animator status=skip reason=torn_down id={id}");
        return;
    };

    let moved = store.borrow_mut().move_to_opposite(id, from_completed);
    info!(
        "event=task_toggle module=animator status=moved id={} moved={}",
        id, moved
    );
    shared.set_state(TransitionState::Entering(id));

    let Some(scheduler) = scheduler.upgrade() else {
        shared.set_state(TransitionState::Idle);
        return;
    };
    let shared = Rc::downgrade(&shared);
    scheduler.after(
        enter,
        Box::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.set_state(TransitionState::Idle);
                debug!("event=task_toggle module=animator status=ok id={id}");
            }
        }),
    );
}
