//! Scheduler Module
//!
//! Deferred-callback schedulers used by the debounce and throttle limiters.
//!
//! Two implementations are provided:
//! - [`TokioScheduler`] runs callbacks on the Tokio runtime after a real delay
//! - [`ManualScheduler`] keeps callbacks in a virtual timeline that only moves
//!   when [`ManualScheduler::advance`] is called

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::clock::{Clock, ManualClock};
use crate::error::{Result, StorageError};

/// A callback queued for later execution.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

// == Timer Handle ==
/// Identifies a scheduled callback so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Returns the raw timer id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

// == Scheduler Trait ==
/// Runs callbacks after a delay.
///
/// Implementations must never run a callback from inside `schedule_after`;
/// callers rely on that to arm a timer while holding their own state lock.
/// Cancelling a timer that has already fired (or was already cancelled) is a
/// no-op.
pub trait Scheduler: Send + Sync {
    /// Queues `callback` to run no earlier than `delay_ms` from now.
    fn schedule_after(&self, delay_ms: u64, callback: TimerCallback) -> TimerHandle;

    /// Cancels a callback that has not started yet.
    fn cancel(&self, handle: TimerHandle);
}

// == Tokio Scheduler ==
/// Scheduler that spawns one sleeping Tokio task per timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    next_id: Arc<AtomicU64>,
    tasks: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
}

impl TokioScheduler {
    /// Creates a scheduler bound to the given runtime.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: Arc::new(AtomicU64::new(1)),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a scheduler bound to the runtime of the calling context.
    ///
    /// Fails when called outside a Tokio runtime.
    pub fn from_current() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| StorageError::Internal(format!("no Tokio runtime: {}", e)))?;
        Ok(Self::new(runtime))
    }

    /// Returns the number of timers that have not fired or been cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay_ms: u64, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let tasks = Arc::clone(&self.tasks);

        // Held across spawn so the task cannot deregister before it is registered
        let mut guard = self.tasks.lock();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            tasks.lock().remove(&id);
            callback();
        });
        guard.insert(id, task);

        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.lock().remove(&handle.0) {
            task.abort();
            debug!("Cancelled timer {}", handle.0);
        }
    }
}

// == Manual Scheduler ==
struct ManualTimer {
    id: u64,
    deadline: u64,
    callback: TimerCallback,
}

/// Scheduler driven by a [`ManualClock`].
///
/// Callbacks fire during [`advance`](Self::advance) in deadline order (ties in
/// scheduling order), with the clock set to each callback's deadline while it
/// runs. Callbacks may schedule further timers; those fire within the same
/// `advance` if they fall due before its end.
///
/// Queued callbacks usually own the wrapper that armed them, and that wrapper
/// owns a handle to this scheduler. A wrapper dropped with a timer still queued
/// therefore lives until the timer fires or [`clear`](Self::clear) is called.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    next_id: Arc<AtomicU64>,
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

impl ManualScheduler {
    /// Creates a scheduler that reads and advances `clock`.
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            next_id: Arc::new(AtomicU64::new(1)),
            timers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the clock this scheduler drives.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Returns the number of queued timers.
    pub fn pending(&self) -> usize {
        self.timers.lock().len()
    }

    /// Drops every queued timer without running it.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.timers.lock());
        drop(dropped);
    }

    /// Moves virtual time forward by `ms`, firing every timer that falls due.
    pub fn advance(&self, ms: u64) {
        let target = self.clock.now_ms() + ms;
        self.advance_to(target);
    }

    /// Moves virtual time to `target_ms`, firing every timer due by then.
    pub fn advance_to(&self, target_ms: u64) {
        while let Some(timer) = self.pop_due(target_ms) {
            if timer.deadline > self.clock.now_ms() {
                self.clock.set(timer.deadline);
            }
            (timer.callback)();
        }
        if target_ms > self.clock.now_ms() {
            self.clock.set(target_ms);
        }
    }

    fn pop_due(&self, target_ms: u64) -> Option<ManualTimer> {
        let mut timers = self.timers.lock();
        let index = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= target_ms)
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(i, _)| i)?;
        Some(timers.remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay_ms: u64, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let deadline = self.clock.now_ms() + delay_ms;
        self.timers.lock().push(ManualTimer {
            id,
            deadline,
            callback,
        });
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.timers.lock().retain(|t| t.id != handle.0);
    }
}
