//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the points account.
//!
//! # Metrics
//!
//! - `points_transactions_total` - Total number of transactions recorded
//! - `points_redemptions_total` - Total number of successful redemptions
//! - `points_redemption_failures_total` - Redemptions rejected or overdrawn
//! - `points_redeemed_total` - Total points paid out by redemptions
//! - `points_normalize_duration_seconds` - Histogram of normalization latencies

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    IntCounter, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total transactions recorded
    pub transactions_total: IntCounter,

    /// Successful redemptions
    pub redemptions_total: IntCounter,

    /// Failed redemptions
    pub redemption_failures_total: IntCounter,

    /// Points redeemed
    pub points_redeemed_total: IntCounter,

    /// Normalization duration histogram
    pub normalize_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let transactions_total = register_int_counter_with_registry!(
            "points_transactions_total",
            "Total number of transactions recorded",
            registry
        )?;

        let redemptions_total = register_int_counter_with_registry!(
            "points_redemptions_total",
            "Total number of successful redemptions",
            registry
        )?;

        let redemption_failures_total = register_int_counter_with_registry!(
            "points_redemption_failures_total",
            "Total number of redemptions that were rejected",
            registry
        )?;

        let points_redeemed_total = register_int_counter_with_registry!(
            "points_redeemed_total",
            "Total points paid out by redemptions",
            registry
        )?;

        let normalize_duration = register_histogram_with_registry!(
            "points_normalize_duration_seconds",
            "Histogram of ledger normalization latencies",
            vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500],
            registry
        )?;

        Ok(Self {
            transactions_total,
            redemptions_total,
            redemption_failures_total,
            points_redeemed_total,
            normalize_duration,
            registry: Arc::new(registry),
        })
    }

    /// Record transaction append
    pub fn record_transaction(&self) {
        self.transactions_total.inc();
    }

    /// Record a successful redemption
    pub fn record_redemption(&self, points: i64) {
        self.redemptions_total.inc();
        self.points_redeemed_total.inc_by(points.max(0) as u64);
    }

    /// Record a failed redemption
    pub fn record_redemption_failure(&self) {
        self.redemption_failures_total.inc();
    }

    /// Record normalization duration
    pub fn record_normalize_duration(&self, duration_seconds: f64) {
        self.normalize_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
