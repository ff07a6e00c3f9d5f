// Prometheus metrics definitions for the court status service.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// 1 while the controller is in manual mode, 0 in automatic mode.
    pub static ref MANUAL_OVERRIDE_ACTIVE: IntGauge =
        IntGauge::new("courts_manual_override_active", "Whether a manual override is in effect").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Status transitions, by source (automatic, manual) and new status.
    pub static ref STATUS_CHANGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("courts_status_changes_total", "Court status transitions"),
        &["source", "status"],
    )
    .unwrap();

    /// Refresh rounds run by the background worker, by outcome.
    pub static ref REFRESH_ROUNDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("courts_refresh_rounds_total", "Automatic refresh rounds"),
        &["outcome"],
    )
    .unwrap();

    /// Weather fetches that failed.
    pub static ref WEATHER_FETCH_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "courts_weather_fetch_failures_total",
        "Weather fetches that failed",
    )
    .unwrap();

    /// Rejected mutation attempts from callers outside the allow-list.
    pub static ref UNAUTHORIZED_ATTEMPTS_TOTAL: IntCounter = IntCounter::new(
        "courts_unauthorized_attempts_total",
        "Mutation attempts by callers outside the allow-list",
    )
    .unwrap();

    /// Telegram commands handled, by command name.
    pub static ref BOT_COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("courts_bot_commands_total", "Telegram commands handled"),
        &["command"],
    )
    .unwrap();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("courts_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MANUAL_OVERRIDE_ACTIVE.clone()),
        Box::new(STATUS_CHANGES_TOTAL.clone()),
        Box::new(REFRESH_ROUNDS_TOTAL.clone()),
        Box::new(WEATHER_FETCH_FAILURES_TOTAL.clone()),
        Box::new(UNAUTHORIZED_ATTEMPTS_TOTAL.clone()),
        Box::new(BOT_COMMANDS_TOTAL.clone()),
        Box::new(API_REQUESTS_TOTAL.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Normalize a URL path for metric labels: status names in
/// `/api/status/{status}` collapse to `:status` and static page paths to `/static`,
/// to bound cardinality.
pub fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/status/") {
        if !rest.is_empty() && !rest.contains('/') {
            return "/api/status/:status".to_string();
        }
    }
    if path.starts_with("/api/") || path == "/health" || path == "/metrics" {
        path.to_string()
    } else {
        "/static".to_string()
    }
}
