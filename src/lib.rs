//! Mini Storage - expiring key-value cache and call rate limiters
//!
//! Provides a local-storage style cache with lazy TTL expiration, debounce and
//! throttle wrappers driven by injectable clocks and schedulers, a few URL and
//! text helpers, and a small HTTP front end over the cache.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod inspect;
pub mod limiter;
pub mod models;
pub mod params;
pub mod scheduler;
pub mod storage;
pub mod text;

pub use api::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use limiter::{Debounce, RateLimiter, Throttle, ThrottleMode};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use storage::{ExpiringCache, MemoryStorage, StorageBackend};
