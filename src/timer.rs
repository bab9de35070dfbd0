//! Delayed callbacks for a single-threaded event loop.
//!
//! - [`Scheduler`]: Schedules and cancels delayed tasks
//! - [`VirtualClock`]: A scheduler whose time only moves when the host advances it
//! - [`Timer`]: A single cancellable slot; scheduling replaces the previous task
//!
//! Nothing here blocks or spawns threads. Hosts that own a real event loop
//! (a browser `setTimeout`, a GUI toolkit timer) implement [`Scheduler`]
//! themselves; everyone else drives a [`VirtualClock`] from their loop.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Identifies a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A task queued for later execution.
pub type Task = Box<dyn FnOnce()>;

/// Runs tasks after a delay on the caller's event loop.
pub trait Scheduler {
    /// Queues `task` to run once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancels a queued task. Returns `false` if it already ran or was cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

/// A deterministic [`Scheduler`] with a manually advanced clock.
///
/// Tasks due at the same instant run in the order they were scheduled.
/// A task may schedule or cancel other tasks while it runs.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
/// use theme_toggle::{Scheduler, VirtualClock};
///
/// let clock = VirtualClock::new();
/// let fired = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&fired);
/// clock.schedule(Duration::from_millis(10), Box::new(move || flag.set(true)));
///
/// clock.advance(Duration::from_millis(9));
/// assert!(!fired.get());
/// clock.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Default)]
pub struct VirtualClock {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TimerId), Task>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the clock was created.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Moves the clock forward, running every task that falls due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        while let Some((due, task)) = self.pop_due(target) {
            self.now.set(due);
            task();
            ran += 1;
        }
        self.now.set(target);
        ran
    }

    /// Runs queued tasks until none remain, moving the clock as needed.
    ///
    /// Does not return if tasks keep rescheduling themselves.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let next_due = self.queue.borrow().keys().next().map(|(due, _)| *due);
            match next_due {
                Some(due) => ran += self.advance(due.saturating_sub(self.now.get())),
                None => return ran,
            }
        }
    }

    fn pop_due(&self, target: Duration) -> Option<(Duration, Task)> {
        let mut queue = self.queue.borrow_mut();
        let key = *queue.keys().next()?;
        if key.0 > target {
            return None;
        }
        queue.remove(&key).map(|task| (key.0, task))
    }
}

impl Scheduler for VirtualClock {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let due = self.now.get() + delay;
        self.queue.borrow_mut().insert((due, id), task);
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut queue = self.queue.borrow_mut();
        let key = queue.keys().find(|(_, queued)| *queued == id).copied();
        key.and_then(|key| queue.remove(&key)).is_some()
    }
}

impl fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualClock")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    pending: Option<TimerId>,
}

/// A single cancellable delayed task.
///
/// [`Timer::replace`] cancels whatever is pending before scheduling the new
/// task. A task that still fires after being superseded (because the host
/// scheduler could not cancel it in time) finds its generation stale and
/// does nothing.
pub struct Timer {
    scheduler: Rc<dyn Scheduler>,
    slot: Rc<RefCell<Slot>>,
}

impl Timer {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            slot: Rc::new(RefCell::new(Slot::default())),
        }
    }

    /// Cancels the pending task, if any, and schedules `task` in its place.
    pub fn replace<F>(&self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        self.cancel();

        let generation = {
            let mut slot = self.slot.borrow_mut();
            slot.generation += 1;
            slot.generation
        };

        let weak = Rc::downgrade(&self.slot);
        let id = self.scheduler.schedule(
            delay,
            Box::new(move || {
                let Some(slot) = weak.upgrade() else {
                    return;
                };
                {
                    let mut slot = slot.borrow_mut();
                    if slot.generation != generation {
                        return;
                    }
                    slot.pending = None;
                }
                task();
            }),
        );

        self.slot.borrow_mut().pending = Some(id);
        id
    }

    /// Cancels the pending task. Returns `false` if nothing was pending.
    pub fn cancel(&self) -> bool {
        let pending = self.slot.borrow_mut().pending.take();
        match pending {
            Some(id) => {
                self.scheduler.cancel(id);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.borrow().pending.is_some()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer").field("slot", &self.slot.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn log_into(log: &Rc<RefCell<Vec<&'static str>>>, label: &'static str) -> Task {
        let log = Rc::clone(log);
        Box::new(move || log.borrow_mut().push(label))
    }

    #[test]
    fn test_clock_runs_in_due_order() {
        let clock = VirtualClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        clock.schedule(ms(20), log_into(&log, "b"));
        clock.schedule(ms(10), log_into(&log, "a"));
        clock.schedule(ms(20), log_into(&log, "c"));

        assert_eq!(clock.advance(ms(25)), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(clock.now(), ms(25));
    }

    #[test]
    fn test_clock_cancel() {
        let clock = VirtualClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = clock.schedule(ms(5), log_into(&log, "a"));

        assert!(clock.cancel(id));
        assert!(!clock.cancel(id));
        assert_eq!(clock.advance(ms(10)), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_clock_task_can_schedule() {
        let clock = Rc::new(VirtualClock::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_clock = Rc::clone(&clock);
        let inner_log = Rc::clone(&log);
        clock.schedule(
            ms(5),
            Box::new(move || {
                inner_log.borrow_mut().push("outer");
                inner_clock.schedule(ms(5), log_into(&inner_log, "inner"));
            }),
        );

        clock.advance(ms(10));
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_run_until_idle() {
        let clock = VirtualClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        clock.schedule(ms(1000), log_into(&log, "late"));

        assert_eq!(clock.run_until_idle(), 1);
        assert_eq!(clock.now(), ms(1000));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_timer_replace_cancels_previous() {
        let clock = Rc::new(VirtualClock::new());
        let timer = Timer::new(clock.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        timer.replace(ms(100), move || first.borrow_mut().push("first"));
        clock.advance(ms(50));
        let second = Rc::clone(&log);
        timer.replace(ms(100), move || second.borrow_mut().push("second"));

        assert_eq!(clock.pending(), 1);
        clock.advance(ms(60));
        assert!(log.borrow().is_empty());
        assert!(timer.is_pending());

        clock.advance(ms(40));
        assert_eq!(*log.borrow(), vec!["second"]);
        assert!(!timer.is_pending());
    }

    /// Scheduler that ignores cancellation, like a host timer that already fired.
    #[derive(Default)]
    struct StubbornScheduler {
        inner: VirtualClock,
    }

    impl Scheduler for StubbornScheduler {
        fn schedule(&self, delay: Duration, task: Task) -> TimerId {
            self.inner.schedule(delay, task)
        }

        fn cancel(&self, _id: TimerId) -> bool {
            false
        }
    }

    #[test]
    fn test_timer_ignores_stale_task() {
        let scheduler = Rc::new(StubbornScheduler::default());
        let timer = Timer::new(scheduler.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&log);
        timer.replace(ms(10), move || first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        timer.replace(ms(20), move || second.borrow_mut().push("second"));

        scheduler.inner.advance(ms(30));
        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn test_timer_drop_cancels() {
        let clock = Rc::new(VirtualClock::new());
        let timer = Timer::new(clock.clone());
        timer.replace(ms(10), || panic!("must not run"));
        drop(timer);

        assert_eq!(clock.pending(), 0);
        clock.advance(ms(20));
    }
}
