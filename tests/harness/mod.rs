// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the upload gateway.
//!
//! Provides payload generators, a storage double that records calls and
//! injects faults, flood patterns and an outcome tally.

#![allow(dead_code)]

pub mod attacks;
pub mod generators;
pub mod metrics;
pub mod store;

use pdf_upload_gateway::clock::{Clock, ManualClock};
use pdf_upload_gateway::config::Config;
use pdf_upload_gateway::handlers::AppState;
use pdf_upload_gateway::metrics::GatewayMetrics;
use pdf_upload_gateway::storage::{ObjectStore, UrlSigner};
use pdf_upload_gateway::UploadGateway;
use std::sync::Arc;
use store::RecordingStore;

/// Fixed start instant for tests: 2023-11-14T22:13:20Z.
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "http://files.test/files/";

/// Everything a gateway test needs, wired to a manual clock.
pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<RecordingStore>,
    pub signer: Arc<UrlSigner>,
    pub config: Config,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let clock = Arc::new(ManualClock::at_millis(START_MILLIS));
        let signer = Arc::new(
            UrlSigner::new(SIGNING_SECRET, BASE_URL, clock.clone() as Arc<dyn Clock>)
                .expect("valid base url"),
        );
        let store = Arc::new(RecordingStore::new(signer.clone()));
        Self {
            clock,
            store,
            signer,
            config,
        }
    }

    pub fn gateway(&self) -> UploadGateway {
        UploadGateway::new(
            &self.config,
            self.store.clone() as Arc<dyn ObjectStore>,
            self.clock.clone() as Arc<dyn Clock>,
            GatewayMetrics::new().expect("metrics registry"),
        )
    }

    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(
            self.config.clone(),
            self.store.clone() as Arc<dyn ObjectStore>,
            self.signer.clone(),
            self.clock.clone() as Arc<dyn Clock>,
            GatewayMetrics::new().expect("metrics registry"),
        ))
    }
}
