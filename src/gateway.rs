// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Upload admission pipeline.
//!
//! Every attempt runs, in order: rate limit, content validation, key
//! derivation, storage write, then issuance of a view link and a download
//! link. The first failing step ends the request; nothing is retried.
//!
//! If the write succeeds but link issuance fails, the object stays in the
//! store with no link ever handed out. That orphan is accepted by default.
//! Setting `compensate_orphans` adds a best-effort delete whose own failure
//! is only logged.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::UploadError;
use crate::identity::ClientKey;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::GatewayMetrics;
use crate::models::{AccessGrant, StorageObjectKey, UploadCandidate};
use crate::naming::NameGenerator;
use crate::storage::{ObjectStore, PutOptions, SignOptions, StorageError};
use crate::validator::ContentValidator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Content type recorded on every stored object.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// How issued grants and stored objects are configured.
#[derive(Debug, Clone)]
pub struct GrantPolicy {
    pub ttl: Duration,
    pub cache_control: String,
    pub compensate_orphans: bool,
}

impl GrantPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: config.storage.grant_ttl(),
            cache_control: config.storage.cache_control.clone(),
            compensate_orphans: config.storage.compensate_orphans,
        }
    }
}

/// Orchestrates admission of one upload at a time.
pub struct UploadGateway {
    limiter: RateLimiter,
    validator: ContentValidator,
    names: NameGenerator,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    policy: GrantPolicy,
    metrics: GatewayMetrics,
}

impl UploadGateway {
    pub fn new(
        config: &Config,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        metrics: GatewayMetrics,
    ) -> Self {
        Self {
            limiter: RateLimiter::new(config.rate_limit.clone(), clock.clone()),
            validator: ContentValidator::new(config.validation.clone()),
            names: NameGenerator::new(clock.clone()),
            store,
            clock,
            policy: GrantPolicy::from_config(config),
            metrics,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn validator(&self) -> &ContentValidator {
        &self.validator
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.metrics
    }

    /// Run one upload attempt through the full pipeline.
    pub async fn handle(
        &self,
        candidate: UploadCandidate,
        client: &ClientKey,
    ) -> Result<AccessGrant, UploadError> {
        if let RateLimitResult::Limited { retry_after, .. } = self.limiter.check(client).await {
            info!(client = %client, retry_after_secs = retry_after.as_secs(), "Upload rate limited");
            return Err(UploadError::RateLimited { retry_after });
        }

        if let Err(reason) = self.validator.validate(&candidate).into_result() {
            info!(
                client = %client,
                declared_name = %candidate.declared_name,
                declared_type = %candidate.declared_content_type,
                error = %reason,
                "Upload rejected"
            );
            return Err(reason.into());
        }

        let key = self.names.generate(&candidate.declared_name);
        self.store_object(&key, &candidate.bytes).await?;

        match self.issue_grant(&key).await {
            Ok(grant) => {
                info!(
                    client = %client,
                    key = %key,
                    size = candidate.actual_size(),
                    expires_at = %grant.expires_at,
                    "Upload accepted"
                );
                Ok(grant)
            }
            Err(e) => {
                self.handle_orphan(&key).await;
                Err(UploadError::GrantIssuanceFailed(e))
            }
        }
    }

    async fn store_object(&self, key: &StorageObjectKey, bytes: &[u8]) -> Result<(), UploadError> {
        let options = PutOptions {
            content_type: PDF_CONTENT_TYPE.to_string(),
            cache_control: self.policy.cache_control.clone(),
            overwrite: false,
        };

        match self.store.put(key, bytes, &options).await {
            Ok(()) => {
                debug!(key = %key, size = bytes.len(), "Stored object");
                self.metrics.record_stored(bytes.len() as u64);
                Ok(())
            }
            Err(e) => {
                error!(key = %key, error = %e, "Storage write failed");
                Err(UploadError::StorageWriteFailed(e))
            }
        }
    }

    async fn issue_grant(&self, key: &StorageObjectKey) -> Result<AccessGrant, StorageError> {
        let ttl = self.policy.ttl;
        let expires_at = self.clock.now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| StorageError::Signing(format!("grant ttl out of range: {e}")))?;

        let view_url = self
            .store
            .sign_url(key, ttl, SignOptions { force_download: false })
            .await
            .inspect_err(|e| error!(key = %key, error = %e, "Failed to sign view link"))?;
        let download_url = self
            .store
            .sign_url(key, ttl, SignOptions { force_download: true })
            .await
            .inspect_err(|e| error!(key = %key, error = %e, "Failed to sign download link"))?;

        Ok(AccessGrant {
            key: key.clone(),
            view_url,
            download_url,
            expires_at,
        })
    }

    async fn handle_orphan(&self, key: &StorageObjectKey) {
        if !self.policy.compensate_orphans {
            warn!(key = %key, "Object stored without an access link");
            self.metrics.record_orphan();
            return;
        }

        match self.store.delete(key).await {
            Ok(()) => info!(key = %key, "Removed object after link issuance failure"),
            Err(e) => {
                warn!(key = %key, error = %e, "Compensating delete failed, object orphaned");
                self.metrics.record_orphan();
            }
        }
    }
}
