//! Prometheus metrics for tkellem.
//!
//! - `tkellem_attach_total` - successful attaches
//! - `tkellem_attached_clients` - clients currently attached (gauge)
//! - `tkellem_handshake_failures_total{error}` - terminal handshake errors
//! - `tkellem_lines_forwarded_total` - client lines forwarded upstream
//! - `tkellem_backlog_replays_total{scope}` - replays started (`full`/`room`)
//!
//! Metrics are registered lazily on first use; serving them is up to the
//! embedding process via [`gather_metrics`].

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

pub static ATTACHES: OnceLock<IntCounter> = OnceLock::new();

pub static HANDSHAKE_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

pub static LINES_FORWARDED: OnceLock<IntCounter> = OnceLock::new();

pub static BACKLOG_REPLAYS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

pub static ATTACHED_CLIENTS: OnceLock<IntGauge> = OnceLock::new();

static INIT: OnceLock<()> = OnceLock::new();

/// Create and register every metric. Idempotent.
pub fn init() {
    INIT.get_or_init(|| {
        let r = registry();

        macro_rules! register {
            ($metric:ident, $init:expr) => {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            };
        }

        register!(ATTACHES, IntCounter::new("tkellem_attach_total", "Successful client attaches"));
        register!(ATTACHED_CLIENTS, IntGauge::new("tkellem_attached_clients", "Clients currently attached"));
        register!(HANDSHAKE_FAILURES, IntCounterVec::new(Opts::new("tkellem_handshake_failures_total", "Terminal handshake errors by kind"), &["error"]));
        register!(LINES_FORWARDED, IntCounter::new("tkellem_lines_forwarded_total", "Client lines forwarded upstream"));
        register!(BACKLOG_REPLAYS, IntCounterVec::new(Opts::new("tkellem_backlog_replays_total", "Backlog replays started"), &["scope"]));
    });
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    init();
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// ============================================================================
// Helper functions
// ============================================================================

#[inline]
pub fn record_attach() {
    init();
    if let Some(c) = ATTACHES.get() {
        c.inc();
    }
    if let Some(g) = ATTACHED_CLIENTS.get() {
        g.inc();
    }
}

#[inline]
pub fn record_detach() {
    if let Some(g) = ATTACHED_CLIENTS.get() {
        g.dec();
    }
}

#[inline]
pub fn record_handshake_failure(error: &str) {
    init();
    if let Some(c) = HANDSHAKE_FAILURES.get() {
        c.with_label_values(&[error]).inc();
    }
}

#[inline]
pub fn record_forward() {
    init();
    if let Some(c) = LINES_FORWARDED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_replay(scope: &str) {
    init();
    if let Some(c) = BACKLOG_REPLAYS.get() {
        c.with_label_values(&[scope]).inc();
    }
}
