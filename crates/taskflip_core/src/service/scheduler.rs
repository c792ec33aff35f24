//! Deferred-callback scheduling.
//!
//! # Responsibility
//! - Define the `after(delay, callback)` seam used by timed transitions.
//! - Provide a host-driven virtual clock (`ManualScheduler`).
//!
//! # Invariants
//! - `after` never runs the callback inline; it only enqueues it.
//! - `ManualScheduler::advance` runs due callbacks in deadline order, ties in
//!   scheduling order, with `now()` set to each callback's deadline.

use log::trace;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

pub type TimerCallback = Box<dyn FnOnce()>;

/// Schedules single-shot callbacks on the owning thread.
pub trait Scheduler {
    fn after(&self, delay: Duration, callback: TimerCallback);
}

impl<T: Scheduler + ?Sized> Scheduler for Rc<T> {
    fn after(&self, delay: Duration, callback: TimerCallback) {
        (**self).after(delay, callback);
    }
}

#[derive(Default)]
struct TimerQueue {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), TimerCallback>,
}

/// Virtual clock advanced explicitly by its owner.
///
/// Used as the fake clock in tests and as the frame-driven clock for hosts
/// that tick the board from their own event loop.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<TimerQueue>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Moves the clock forward by `by`, running every callback that falls due.
    ///
    /// Callbacks may schedule further callbacks; those run in the same call
    /// when their deadline is within the window. Returns the number fired.
    ///
    /// Must not be called from inside a timer callback.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0_usize;

        while let Some(callback) = self.pop_due(target) {
            callback();
            fired += 1;
        }

        self.queue.borrow_mut().now = target;
        if fired > 0 {
            trace!(
                "event=timers_fired module=scheduler status=ok fired={} now_ms={}",
                fired,
                target.as_millis()
            );
        }
        fired
    }

    fn pop_due(&self, target: Duration) -> Option<TimerCallback> {
        let mut queue = self.queue.borrow_mut();
        let (&(deadline, _), _) = queue.pending.first_key_value()?;
        if deadline > target {
            return None;
        }
        let (_, callback) = queue.pending.pop_first()?;
        queue.now = deadline;
        Some(callback)
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) {
        let mut queue = self.queue.borrow_mut();
        let deadline = queue.now + delay;
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.pending.insert((deadline, seq), callback);
    }
}

#[cfg(test)]
mod tests {
    use super::{ManualScheduler, Scheduler};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn callbacks_wait_for_their_deadline() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&fired);
        scheduler.after(ms(100), Box::new(move || log.borrow_mut().push("a")));

        assert_eq!(scheduler.advance(ms(99)), 0);
        assert!(fired.borrow().is_empty());
        assert_eq!(scheduler.advance(ms(1)), 1);
        assert_eq!(*fired.borrow(), vec!["a"]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), ms(100));
    }

    #[test]
    fn callbacks_run_in_deadline_then_schedule_order() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(50, "late"), (10, "first"), (10, "second")] {
            let log = Rc::clone(&fired);
            scheduler.after(ms(delay), Box::new(move || log.borrow_mut().push(label)));
        }

        scheduler.advance(ms(60));
        assert_eq!(*fired.borrow(), vec!["first", "second", "late"]);
    }

    #[test]
    fn nested_callbacks_fire_within_the_same_window() {
        let scheduler = Rc::new(ManualScheduler::new());
        let seen_at = Rc::new(RefCell::new(Vec::new()));

        let inner_scheduler = Rc::clone(&scheduler);
        let log = Rc::clone(&seen_at);
        scheduler.after(
            ms(240),
            Box::new(move || {
                log.borrow_mut().push(inner_scheduler.now());
                let log = Rc::clone(&log);
                let clock = Rc::clone(&inner_scheduler);
                inner_scheduler.after(
                    ms(320),
                    Box::new(move || log.borrow_mut().push(clock.now())),
                );
            }),
        );

        assert_eq!(scheduler.advance(ms(1_000)), 2);
        assert_eq!(*seen_at.borrow(), vec![ms(240), ms(560)]);
        assert_eq!(scheduler.now(), ms(1_000));
    }
}
