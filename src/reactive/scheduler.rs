//! Update Scheduler - Deferred, batched notification delivery.
//!
//! Setting a value never runs observer callbacks inline. Each affected
//! observer enqueues a task here, and the host loop calls [`Scheduler::flush`]
//! once per tick, after input processing and before redraw.
//!
//! # Draining
//!
//! A flush pops tasks one at a time until the queue is empty. Tasks run
//! during a flush may enqueue more tasks (a branch swap mounting new
//! observers, a callback setting another value); those are drained by the
//! same flush, so the tree is quiescent when `flush` returns.
//!
//! Delivery follows enqueue order. Nothing else is promised across
//! independent values.
//!
//! # Isolation
//!
//! The scheduler is an explicit object, not a hidden global. The [`Root`]
//! hands it to every scope it mounts, and tests build their own.
//!
//! [`Root`]: crate::root::Root

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::error::{fatal, Error, Result};

/// A queued notification.
pub type Task = Box<dyn FnOnce()>;

/// Summary of one flush.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushStats {
    /// Tasks delivered by this flush.
    pub delivered: usize,
    /// Largest queue length seen while draining.
    pub peak_pending: usize,
}

struct SchedulerInner {
    queue: RefCell<VecDeque<Task>>,
    flushing: Cell<bool>,
    config: Config,
    total_delivered: Cell<u64>,
}

/// Shared handle to a notification queue.
///
/// Cloning a `Scheduler` yields another handle to the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("flushing", &self.is_flushing())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Clears the flushing flag even when a callback panics.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Scheduler {
    /// Create a scheduler with default settings.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a scheduler configured from the environment.
    pub fn from_env() -> Self {
        Self::with_config(Config::from_env())
    }

    /// Create a scheduler with explicit settings.
    pub fn with_config(config: Config) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                queue: RefCell::new(VecDeque::new()),
                flushing: Cell::new(false),
                config,
                total_delivered: Cell::new(0),
            }),
        }
    }

    /// Settings this scheduler was built with.
    pub fn config(&self) -> Config {
        self.inner.config
    }

    /// Enqueue a task for the next flush.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.inner.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting for delivery.
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Whether a flush is currently draining.
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }

    /// Total tasks delivered over the scheduler's lifetime.
    pub fn total_delivered(&self) -> u64 {
        self.inner.total_delivered.get()
    }

    /// Whether two handles refer to the same queue.
    pub fn ptr_eq(&self, other: &Scheduler) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Drain the queue to empty.
    ///
    /// Panics if the configured flush limit is exceeded.
    pub fn flush(&self) -> FlushStats {
        self.try_flush().unwrap_or_else(|err| fatal(err))
    }

    /// Drain the queue to empty, reporting a flush-limit overrun as an error.
    ///
    /// Calling this from inside a task is a no-op: the outer drain picks up
    /// whatever the task enqueued. On error, undelivered tasks stay queued.
    pub fn try_flush(&self) -> Result<FlushStats> {
        let mut stats = FlushStats::default();
        if self.inner.flushing.get() {
            return Ok(stats);
        }

        self.inner.flushing.set(true);
        let _guard = FlushGuard(&self.inner.flushing);
        let limit = self.inner.config.flush_limit;

        loop {
            // Pop under a short borrow; the task may schedule more work.
            let task = {
                let mut queue = self.inner.queue.borrow_mut();
                stats.peak_pending = stats.peak_pending.max(queue.len());
                queue.pop_front()
            };
            let Some(task) = task else { break };

            if let Some(limit) = limit {
                if stats.delivered >= limit {
                    self.inner.queue.borrow_mut().push_front(task);
                    return Err(Error::FlushLimitExceeded { limit });
                }
            }

            task();
            stats.delivered += 1;
            self.inner
                .total_delivered
                .set(self.inner.total_delivered.get() + 1);
        }

        if stats.delivered > 0 {
            tracing::debug!(
                delivered = stats.delivered,
                peak_pending = stats.peak_pending,
                "scheduler flushed"
            );
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |label: &'static str| -> Task {
            let log = log_clone.clone();
            Box::new(move || log.borrow_mut().push(label))
        };
        (log, make)
    }

    #[test]
    fn test_schedule_is_deferred() {
        let scheduler = Scheduler::new();
        let (log, make) = recorder();

        scheduler.schedule(make("a"));
        assert!(log.borrow().is_empty(), "schedule must not run the task");
        assert_eq!(scheduler.pending(), 1);

        let stats = scheduler.flush();
        assert_eq!(stats.delivered, 1);
        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_flush_preserves_enqueue_order() {
        let scheduler = Scheduler::new();
        let (log, make) = recorder();

        scheduler.schedule(make("first"));
        scheduler.schedule(make("second"));
        scheduler.schedule(make("third"));
        scheduler.flush();

        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_tasks_enqueued_during_flush_drain_in_same_flush() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_scheduler = scheduler.clone();
        let outer_log = log.clone();
        scheduler.schedule(move || {
            outer_log.borrow_mut().push("outer");
            let nested_log = outer_log.clone();
            inner_scheduler.schedule(move || nested_log.borrow_mut().push("nested"));
        });

        let stats = scheduler.flush();
        assert_eq!(stats.delivered, 2);
        assert_eq!(*log.borrow(), vec!["outer", "nested"]);
        assert_eq!(scheduler.pending(), 0, "flush must reach quiescence");
    }

    #[test]
    fn test_nested_flush_is_noop() {
        let scheduler = Scheduler::new();
        let nested_stats = Rc::new(Cell::new(None));

        let inner = scheduler.clone();
        let stats_clone = nested_stats.clone();
        scheduler.schedule(move || {
            inner.schedule(|| {});
            stats_clone.set(Some(inner.flush()));
        });

        let stats = scheduler.flush();
        assert_eq!(nested_stats.get(), Some(FlushStats::default()));
        assert_eq!(stats.delivered, 2);
    }

    #[test]
    fn test_flush_limit_reports_error_and_keeps_queue() {
        let scheduler = Scheduler::with_config(Config::default().with_flush_limit(2));
        for _ in 0..3 {
            scheduler.schedule(|| {});
        }

        let result = scheduler.try_flush();
        assert_eq!(result, Err(Error::FlushLimitExceeded { limit: 2 }));
        assert_eq!(scheduler.pending(), 1);
        assert!(!scheduler.is_flushing(), "flag must reset after error");
    }

    #[test]
    fn test_clone_shares_queue() {
        let a = Scheduler::new();
        let b = a.clone();
        b.schedule(|| {});
        assert_eq!(a.pending(), 1);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Scheduler::new()));
    }

    #[test]
    fn test_total_delivered_accumulates() {
        let scheduler = Scheduler::new();
        scheduler.schedule(|| {});
        scheduler.flush();
        scheduler.schedule(|| {});
        scheduler.schedule(|| {});
        scheduler.flush();
        assert_eq!(scheduler.total_delivered(), 3);
    }
}
