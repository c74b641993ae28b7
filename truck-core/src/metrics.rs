//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the register.
//!
//! # Metrics
//!
//! - `truck_purchases_total` - Purchases committed
//! - `truck_purchases_rejected_total` - Purchase requests rejected
//! - `truck_purchase_duration_seconds` - Histogram of purchase latencies

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Purchases committed
    pub purchases_total: IntCounter,

    /// Purchase requests rejected (guard, validation, or lookup failures)
    pub purchases_rejected_total: IntCounter,

    /// Purchase latency histogram
    pub purchase_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let purchases_total = register_int_counter_with_registry!(
            Opts::new("truck_purchases_total", "Purchases committed"),
            registry
        )?;

        let purchases_rejected_total = register_int_counter_with_registry!(
            Opts::new(
                "truck_purchases_rejected_total",
                "Purchase requests rejected"
            ),
            registry
        )?;

        let purchase_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "truck_purchase_duration_seconds",
                "Histogram of purchase latencies"
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
            registry
        )?;

        Ok(Self {
            purchases_total,
            purchases_rejected_total,
            purchase_duration,
            registry: Arc::new(registry),
        })
    }

    /// Record a committed purchase
    pub fn record_purchase(&self, duration_seconds: f64) {
        self.purchases_total.inc();
        self.purchase_duration.observe(duration_seconds);
    }

    /// Record a rejected purchase
    pub fn record_rejection(&self, duration_seconds: f64) {
        self.purchases_rejected_total.inc();
        self.purchase_duration.observe(duration_seconds);
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        // Text format is ASCII
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
