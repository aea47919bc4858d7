//! Debounce
//!
//! Collapses a burst of calls into one execution per quiet period.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::limiter::{Callback, PendingTimer};
use crate::scheduler::Scheduler;

// == Debounce ==
/// A debounced callable. Clones share state.
///
/// States are idle (no timer) and pending (timer armed). Every call re-arms
/// the timer, cancelling the previous one:
/// - trailing mode runs `func` with the latest arguments when the timer fires
/// - leading mode runs `func` synchronously on a call made while idle, and the
///   timer firing only returns the wrapper to idle
pub struct Debounce<A> {
    inner: Arc<DebounceInner<A>>,
}

struct DebounceInner<A> {
    func: Callback<A>,
    wait_ms: u64,
    immediate: bool,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<DebounceState>,
}

#[derive(Default)]
struct DebounceState {
    pending: Option<PendingTimer>,
    generation: u64,
}

impl<A> Clone for Debounce<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Send + 'static> Debounce<A> {
    // == Constructor ==
    /// Wraps `func` with a `wait_ms` quiet period.
    ///
    /// # Arguments
    /// * `func` - The callable to shape
    /// * `wait_ms` - Quiet period in milliseconds
    /// * `immediate` - Run on the leading edge instead of the trailing edge
    /// * `scheduler` - Where the quiet-period timer is armed
    pub fn new<F>(func: F, wait_ms: u64, immediate: bool, scheduler: Arc<dyn Scheduler>) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(DebounceInner {
                func: Arc::new(func),
                wait_ms,
                immediate,
                scheduler,
                state: Mutex::new(DebounceState::default()),
            }),
        }
    }

    // == Call ==
    /// Invokes the debounced callable with `args`.
    pub fn call(&self, args: A) {
        let inner = &self.inner;
        let run_now = {
            let mut state = inner.state.lock();
            let was_idle = state.pending.is_none();
            if let Some(previous) = state.pending.take() {
                inner.scheduler.cancel(previous.handle);
            }

            let (deferred, run_now) = if inner.immediate {
                (None, if was_idle { Some(args) } else { None })
            } else {
                (Some(args), None)
            };

            state.generation += 1;
            let generation = state.generation;
            let target = Arc::clone(inner);
            let handle = inner.scheduler.schedule_after(
                inner.wait_ms,
                Box::new(move || target.fire(generation, deferred)),
            );
            state.pending = Some(PendingTimer { generation, handle });
            run_now
        };

        // Outside the lock so `func` may call back into this wrapper
        if let Some(args) = run_now {
            (inner.func)(args);
        }
    }

    /// Returns true while a quiet-period timer is armed.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    /// Returns the quiet period in milliseconds.
    pub fn wait_ms(&self) -> u64 {
        self.inner.wait_ms
    }
}

impl<A> DebounceInner<A> {
    fn fire(&self, generation: u64, args: Option<A>) {
        {
            let mut state = self.state.lock();
            if state.pending.map(|p| p.generation) != Some(generation) {
                return;
            }
            state.pending = None;
        }
        if let Some(args) = args {
            (self.func)(args);
        }
    }
}
