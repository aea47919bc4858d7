//! Throttle
//!
//! Limits a callable to one execution per window.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::limiter::{Callback, PendingTimer};
use crate::scheduler::Scheduler;

// == Throttle Mode ==
/// How a [`Throttle`] decides when to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrottleMode {
    /// Run synchronously when more than the window has passed since the last
    /// run, using the triggering call's arguments; drop other calls.
    Timestamp,
    /// On a call with no timer armed, schedule a run after the window using
    /// that call's arguments; drop calls while the timer is armed.
    Timer,
}

// == Throttle ==
/// A throttled callable. Clones share state.
pub struct Throttle<A> {
    inner: Arc<ThrottleInner<A>>,
}

struct ThrottleInner<A> {
    func: Callback<A>,
    wait_ms: u64,
    mode: ThrottleMode,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<ThrottleState>,
}

#[derive(Default)]
struct ThrottleState {
    /// None until the first timestamp-mode run
    last_invoked_at: Option<u64>,
    pending: Option<PendingTimer>,
    generation: u64,
}

impl<A> Clone for Throttle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Send + 'static> Throttle<A> {
    // == Constructor ==
    /// Wraps `func` so it runs at most once per `wait_ms`.
    ///
    /// `clock` is only consulted in timestamp mode and `scheduler` only in
    /// timer mode.
    pub fn new<F>(
        func: F,
        wait_ms: u64,
        mode: ThrottleMode,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ThrottleInner {
                func: Arc::new(func),
                wait_ms,
                mode,
                clock,
                scheduler,
                state: Mutex::new(ThrottleState::default()),
            }),
        }
    }

    // == Call ==
    /// Invokes the throttled callable with `args`.
    pub fn call(&self, args: A) {
        match self.inner.mode {
            ThrottleMode::Timestamp => self.call_timestamp(args),
            ThrottleMode::Timer => self.call_timer(args),
        }
    }

    fn call_timestamp(&self, args: A) {
        let inner = &self.inner;
        let now = inner.clock.now_ms();
        let run = {
            let mut state = inner.state.lock();
            let due = match state.last_invoked_at {
                None => true,
                Some(last) => now.saturating_sub(last) > inner.wait_ms,
            };
            if due {
                state.last_invoked_at = Some(now);
            }
            due
        };

        if run {
            (inner.func)(args);
        }
    }

    fn call_timer(&self, args: A) {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.pending.is_some() {
            return;
        }

        state.generation += 1;
        let generation = state.generation;
        let target = Arc::clone(inner);
        let handle = inner.scheduler.schedule_after(
            inner.wait_ms,
            Box::new(move || target.fire(generation, args)),
        );
        state.pending = Some(PendingTimer { generation, handle });
    }

    /// Returns true while a timer-mode run is scheduled.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    /// Returns the time of the last timestamp-mode run.
    pub fn last_invoked_at(&self) -> Option<u64> {
        self.inner.state.lock().last_invoked_at
    }

    /// Returns the configured mode.
    pub fn mode(&self) -> ThrottleMode {
        self.inner.mode
    }
}

impl<A> ThrottleInner<A> {
    fn fire(&self, generation: u64, args: A) {
        {
            let mut state = self.state.lock();
            if state.pending.map(|p| p.generation) != Some(generation) {
                return;
            }
            state.pending = None;
        }
        (self.func)(args);
    }
}
