// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the upload gateway.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Gateway counters, registered on a private registry.
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    /// Finished upload requests by outcome
    uploads_total: IntCounterVec,
    /// Bytes persisted by successful writes
    upload_bytes_total: IntCounter,
    /// Objects left behind by failed link issuance
    orphaned_objects_total: IntCounter,
    /// Client keys with a tracked rate window
    rate_limit_windows: IntGauge,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let uploads_total = IntCounterVec::new(
            Opts::new("pdf_gateway_uploads_total", "Upload requests by outcome"),
            &["outcome"],
        )?;
        let upload_bytes_total = IntCounter::new(
            "pdf_gateway_upload_bytes_total",
            "Bytes written to object storage",
        )?;
        let orphaned_objects_total = IntCounter::new(
            "pdf_gateway_orphaned_objects_total",
            "Stored objects for which no access link was issued",
        )?;
        let rate_limit_windows = IntGauge::new(
            "pdf_gateway_rate_limit_windows",
            "Client keys currently tracked by the rate limiter",
        )?;

        registry.register(Box::new(uploads_total.clone()))?;
        registry.register(Box::new(upload_bytes_total.clone()))?;
        registry.register(Box::new(orphaned_objects_total.clone()))?;
        registry.register(Box::new(rate_limit_windows.clone()))?;

        Ok(Self {
            registry,
            uploads_total,
            upload_bytes_total,
            orphaned_objects_total,
            rate_limit_windows,
        })
    }

    pub fn record_outcome(&self, outcome: &str) {
        self.uploads_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_stored(&self, bytes: u64) {
        self.upload_bytes_total.inc_by(bytes);
    }

    pub fn record_orphan(&self) {
        self.orphaned_objects_total.inc();
    }

    pub fn set_rate_limit_windows(&self, count: usize) {
        self.rate_limit_windows
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.uploads_total.with_label_values(&[outcome]).get()
    }

    pub fn orphan_count(&self) -> u64 {
        self.orphaned_objects_total.get()
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}
