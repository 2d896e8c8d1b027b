// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Upload flood patterns for abuse testing.

use super::generators::{client_keys, disguised_candidate, pdf_candidate};
use super::metrics::FloodMetrics;
use pdf_upload_gateway::{ClientKey, UploadGateway};
use std::time::Instant;

/// Flood pattern configuration.
#[derive(Debug, Clone)]
pub struct FloodConfig {
    /// Total number of upload attempts
    pub total_requests: usize,
    /// Number of distinct client keys the attempts rotate through
    pub unique_clients: usize,
    /// Send non-PDF bytes instead of a PDF
    pub disguised_payload: bool,
    /// Send every attempt without an identifying header
    pub anonymous: bool,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            unique_clients: 1,
            disguised_payload: false,
            anonymous: false,
        }
    }
}

/// Predefined flood patterns.
impl FloodConfig {
    /// One client hammering the endpoint.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 200,
            unique_clients: 1,
            ..Default::default()
        }
    }

    /// Many clients, a few attempts each.
    pub fn distributed_flood() -> Self {
        Self {
            total_requests: 500,
            unique_clients: 100,
            ..Default::default()
        }
    }

    /// Clients that send no forwarding headers at all.
    pub fn anonymous_crowd() -> Self {
        Self {
            total_requests: 50,
            unique_clients: 50,
            anonymous: true,
            ..Default::default()
        }
    }

    /// Executables and images dressed up as PDFs.
    pub fn disguised_payloads() -> Self {
        Self {
            total_requests: 50,
            unique_clients: 50,
            disguised_payload: true,
            ..Default::default()
        }
    }

    /// Client key used for attempt `i`.
    pub fn client_for(&self, i: usize, pool: &[ClientKey]) -> ClientKey {
        if self.anonymous {
            ClientKey::unknown()
        } else {
            pool[i % pool.len()].clone()
        }
    }

    /// Most uploads the gateway may accept for this pattern within one window.
    pub fn max_accepted(&self, max_per_window: u32) -> usize {
        if self.disguised_payload {
            return 0;
        }
        let clients = if self.anonymous { 1 } else { self.unique_clients };
        (clients * max_per_window as usize).min(self.total_requests)
    }

    /// Drive the pattern through `gateway` sequentially.
    pub async fn run(&self, gateway: &UploadGateway) -> FloodMetrics {
        let pool = client_keys(self.unique_clients.max(1));
        let mut metrics = FloodMetrics::new();
        metrics.start();

        for i in 0..self.total_requests {
            let client = self.client_for(i, &pool);
            let candidate = if self.disguised_payload {
                disguised_candidate(&format!("invoice-{i}.pdf"), b"MZ\x90\x00 not a pdf")
            } else {
                pdf_candidate(&format!("report {i}.pdf"))
            };

            let started = Instant::now();
            let result = gateway.handle(candidate, &client).await;
            metrics.record(&result, client.as_str(), started.elapsed());
        }

        metrics.finish();
        metrics
    }
}
