//! API Handlers
//!
//! HTTP request handlers for each storage server endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Result, StorageError};
use crate::limiter::{Debounce, RateLimiter, Throttle, ThrottleMode};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, ParamResponse, ParamsQuery, SetRequest,
    SetResponse, StatsResponse,
};
use crate::params::{get_url_param, search_of};
use crate::text::{trim, TrimMode};
use crate::storage::{load_snapshot, ExpiringCache, MemoryStorage, SnapshotWriter};

/// Application state shared across all handlers.
///
/// The cache is internally synchronized, so handlers share it through an Arc
/// without an outer lock.
#[derive(Clone)]
pub struct AppState {
    /// Expiring cache over in-memory storage
    pub cache: Arc<ExpiringCache<MemoryStorage>>,
    /// TTL applied to writes that don't carry one
    pub default_ttl_ms: Option<u64>,
    /// Serialized snapshot writer, when persistence is enabled
    snapshot: Option<Arc<SnapshotWriter>>,
    /// Debounced snapshot writer, when persistence is enabled
    persist: Option<Debounce<()>>,
    /// Throttled activity summary logger
    activity: Throttle<()>,
}

impl AppState {
    /// Creates a new AppState over the given cache.
    ///
    /// Activity summaries are logged at most once per
    /// `activity_log_interval_ms`. Persistence is off until
    /// [`with_snapshot`](Self::with_snapshot) is called.
    pub fn new(
        cache: Arc<ExpiringCache<MemoryStorage>>,
        limiter: &RateLimiter,
        activity_log_interval_ms: u64,
    ) -> Self {
        let observed = Arc::clone(&cache);
        let activity = limiter.throttle(
            move |_: ()| {
                let stats = observed.stats();
                info!(
                    "Cache activity: hits={}, misses={}, expirations={}, writes={}, entries={}",
                    stats.hits, stats.misses, stats.expirations, stats.writes, stats.total_entries
                );
            },
            activity_log_interval_ms,
            ThrottleMode::Timestamp,
        );

        Self {
            cache,
            default_ttl_ms: None,
            snapshot: None,
            persist: None,
            activity,
        }
    }

    /// Sets the TTL applied to writes without one.
    pub fn with_default_ttl(mut self, default_ttl_ms: Option<u64>) -> Self {
        self.default_ttl_ms = default_ttl_ms;
        self
    }

    /// Persists storage to `path` once writes have been quiet for `debounce_ms`.
    ///
    /// Debounced saves and [`flush_snapshot`](Self::flush_snapshot) share one
    /// writer, so they never overlap.
    pub fn with_snapshot(mut self, path: PathBuf, debounce_ms: u64, limiter: &RateLimiter) -> Self {
        let writer = Arc::new(SnapshotWriter::new(path, Arc::clone(self.cache.backend())));
        let target = Arc::clone(&writer);
        self.persist = Some(limiter.debounce(
            move |_: ()| {
                if let Err(e) = target.save() {
                    warn!("Snapshot write to {} failed: {}", target.path().display(), e);
                }
            },
            debounce_ms,
            false,
        ));
        self.snapshot = Some(writer);
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Restores the snapshot file first when one is configured, dropping records
    /// that expired in the meantime.
    pub fn from_config(
        config: &Config,
        limiter: &RateLimiter,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let storage = match &config.snapshot_path {
            Some(path) => MemoryStorage::from_snapshot(load_snapshot(path)?),
            None => MemoryStorage::new(),
        };
        let cache = Arc::new(ExpiringCache::new(Arc::new(storage), clock));
        let purged = cache.purge_expired();
        if purged > 0 {
            info!("Dropped {} records that expired while offline", purged);
        }

        let mut state = Self::new(cache, limiter, config.activity_log_interval_ms)
            .with_default_ttl(config.default_ttl_ms);
        if let Some(path) = &config.snapshot_path {
            state = state.with_snapshot(path.clone(), config.snapshot_debounce_ms, limiter);
        }
        Ok(state)
    }

    /// Writes the snapshot immediately, bypassing the debounce.
    ///
    /// No-op when persistence is off.
    pub fn flush_snapshot(&self) -> Result<()> {
        if let Some(writer) = &self.snapshot {
            let count = writer.save()?;
            info!("Flushed {} records to {}", count, writer.path().display());
        }
        Ok(())
    }

    fn schedule_persist(&self) {
        if let Some(persist) = &self.persist {
            persist.call(());
        }
    }

    fn record_activity(&self) {
        self.activity.call(());
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in the cache with an optional TTL in milliseconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(StorageError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.or(state.default_ttl_ms);
    state.cache.set(&req.key, &req.value, ttl)?;
    state.schedule_persist();
    state.record_activity();

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key. Expired records are purged and
/// reported as not found.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    state.record_activity();
    let value: Value = state
        .cache
        .get(&key)
        .ok_or_else(|| StorageError::NotFound(key.clone()))?;
    let ttl_remaining = state.cache.ttl_remaining_ms(&key);

    Ok(Json(GetResponse::new(key, value, ttl_remaining)))
}

/// Handler for DELETE /del/:key
///
/// Clears a key. Clearing a missing key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.clear(&key);
    state.schedule_persist();
    state.record_activity();

    Json(DeleteResponse::new(key))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /params
///
/// Extracts one query parameter from a URL or a bare `?` query string.
/// Whitespace around the parameter name is ignored.
pub async fn params_handler(Query(query): Query<ParamsQuery>) -> Json<ParamResponse> {
    let search = if query.url.starts_with('?') {
        query.url.as_str()
    } else {
        search_of(&query.url)
    };
    let name = trim(&query.name, TrimMode::Both);
    let value = get_url_param(&name, search);

    Json(ParamResponse { name, value })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
