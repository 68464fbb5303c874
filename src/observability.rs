use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Host REST API usage metrics
#[derive(Debug, Default)]
pub struct HostApiMetrics {
    pub total_requests: AtomicU64,
    pub errors: AtomicU64,
    pub conflicts: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub status_updates: AtomicU64,
}

impl HostApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
        warn!("Status update rejected: record changed since the list was loaded");
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_update(&self) {
        self.status_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> HostApiStats {
        HostApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            status_updates: self.status_updates.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Host API metrics: requests={}, errors={}, conflicts={}, status_updates={}, cache_hits={}, cache_misses={}",
            stats.total_requests,
            stats.errors,
            stats.conflicts,
            stats.status_updates,
            stats.cache_hits,
            stats.cache_misses
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostApiStats {
    pub total_requests: u64,
    pub errors: u64,
    pub conflicts: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub status_updates: u64,
}

static HOST_METRICS: std::sync::LazyLock<HostApiMetrics> = std::sync::LazyLock::new(HostApiMetrics::new);

pub fn host_metrics() -> &'static HostApiMetrics {
    &HOST_METRICS
}

/// Span wrapping one plugin event dispatch
pub fn create_event_span(event: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!("plugin_event", event.name = event, correlation.id = correlation_id)
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
