//! Limiter Module
//!
//! Debounce and throttle wrappers that shape how often a callable runs in
//! response to a burst of calls.
//!
//! # Strategies
//! - [`Debounce`] trailing: runs once, with the last call's arguments, after a
//!   quiet period
//! - [`Debounce`] leading: runs on the first call of a burst, then stays quiet
//!   until a full quiet period has passed
//! - [`Throttle`] with [`ThrottleMode::Timestamp`]: runs immediately, at most
//!   once per window
//! - [`Throttle`] with [`ThrottleMode::Timer`]: runs at the end of a window
//!   opened by the first call, with that call's arguments
//!
//! Each wrapper owns its own state; wrappers never share timers.

mod debounce;
mod throttle;


use std::sync::Arc;

pub use debounce::Debounce;
pub use throttle::{Throttle, ThrottleMode};

use crate::clock::Clock;
use crate::scheduler::{Scheduler, TimerHandle};

/// The wrapped callable.
pub(crate) type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// A scheduled invocation tagged with the generation that armed it.
///
/// A timer callback only acts if its generation still matches, so a timer
/// that fires while being cancelled is ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingTimer {
    pub generation: u64,
    pub handle: TimerHandle,
}

// == Rate Limiter ==
/// Factory for debounce and throttle wrappers sharing one clock and scheduler.
#[derive(Clone)]
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
}

impl RateLimiter {
    /// Creates a factory reading time from `clock` and deferring work to `scheduler`.
    pub fn new(clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self { clock, scheduler }
    }

    /// Wraps `func` in a debounce with a `wait_ms` quiet period.
    ///
    /// `immediate` selects leading-edge instead of trailing-edge execution.
    pub fn debounce<A, F>(&self, func: F, wait_ms: u64, immediate: bool) -> Debounce<A>
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        Debounce::new(func, wait_ms, immediate, Arc::clone(&self.scheduler))
    }

    /// Wraps `func` in a throttle allowing one execution per `wait_ms`.
    pub fn throttle<A, F>(&self, func: F, wait_ms: u64, mode: ThrottleMode) -> Throttle<A>
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        Throttle::new(
            func,
            wait_ms,
            mode,
            Arc::clone(&self.clock),
            Arc::clone(&self.scheduler),
        )
    }
}
