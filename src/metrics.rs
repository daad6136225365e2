//! Prometheus counters for chain resolution.
//!
//! Metrics are registered on a caller-supplied [`Registry`] rather than the
//! global default, so several chains (or tests) can coexist in one process.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters describing how a chain resolves values.
#[derive(Clone, Debug)]
pub struct ChainMetrics {
    /// Resolutions served, labelled by the supplying tier.
    pub hits: IntCounterVec,

    /// Resolutions where every tier came up empty.
    pub misses: IntCounter,

    /// Tier reads that failed (transport, decode, I/O), labelled by tier.
    pub read_errors: IntCounterVec,

    /// Propagation writes that failed, labelled by tier.
    pub write_failures: IntCounterVec,
}

impl ChainMetrics {
    /// Create the counters and register them on `registry`.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let hits = IntCounterVec::new(
            Opts::new("chain_resource_hits_total", "Values resolved, by supplying tier"),
            &["tier"],
        )?;
        let misses = IntCounter::new(
            "chain_resource_misses_total",
            "Resolutions where no tier supplied a value",
        )?;
        let read_errors = IntCounterVec::new(
            Opts::new("chain_resource_read_errors_total", "Failed tier reads"),
            &["tier"],
        )?;
        let write_failures = IntCounterVec::new(
            Opts::new(
                "chain_resource_write_failures_total",
                "Failed propagation writes",
            ),
            &["tier"],
        )?;

        registry.register(Box::new(hits.clone()))?;
        registry.register(Box::new(misses.clone()))?;
        registry.register(Box::new(read_errors.clone()))?;
        registry.register(Box::new(write_failures.clone()))?;

        Ok(Self {
            hits,
            misses,
            read_errors,
            write_failures,
        })
    }

    pub(crate) fn record_hit(&self, tier: &str) {
        self.hits.with_label_values(&[tier]).inc();
    }

    pub(crate) fn record_miss(&self) {
        self.misses.inc();
    }

    pub(crate) fn record_read_error(&self, tier: &str) {
        self.read_errors.with_label_values(&[tier]).inc();
    }

    pub(crate) fn record_write_failure(&self, tier: &str) {
        self.write_failures.with_label_values(&[tier]).inc();
    }
}

/// Encode everything registered on `registry` in the Prometheus text format.
pub fn render(registry: &Registry) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
