// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Signed, time-limited object links.
//!
//! A link carries its expiry and download flag in the query string plus a
//! keyed BLAKE3 MAC over `key`, expiry and flag, so none of them can be
//! altered without invalidating the signature.

use crate::clock::Clock;
use crate::models::StorageObjectKey;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const KEY_CONTEXT: &str = "pdf-upload-gateway 2025 object link signing key";

/// Link verification and signing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Link has expired")]
    Expired,

    #[error("Link signature is invalid")]
    Invalid,

    #[error("Link expiry is out of range")]
    OutOfRange,

    #[error("Cannot build link URL: {0}")]
    Url(String),
}

/// Query parameters presented with a signed link.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedAccess {
    /// Expiry as Unix seconds
    pub expires: i64,
    #[serde(default)]
    pub download: Option<u8>,
    pub signature: String,
}

impl SignedAccess {
    pub fn force_download(&self) -> bool {
        self.download == Some(1)
    }
}

/// Mints and checks signed links rooted at a public base URL.
pub struct UrlSigner {
    key: [u8; 32],
    base_url: Url,
    clock: Arc<dyn Clock>,
}

impl UrlSigner {
    pub fn new(secret: &str, base_url: &str, clock: Arc<dyn Clock>) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url)?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            base_url,
            clock,
        })
    }

    /// Link to `key` valid for `ttl` from now.
    pub fn sign(
        &self,
        key: &StorageObjectKey,
        ttl: Duration,
        force_download: bool,
    ) -> Result<String, SignatureError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| SignatureError::OutOfRange)?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or(SignatureError::OutOfRange)?;
        self.sign_until(key, expires_at, force_download)
    }

    /// Link to `key` valid until `expires_at`.
    pub fn sign_until(
        &self,
        key: &StorageObjectKey,
        expires_at: DateTime<Utc>,
        force_download: bool,
    ) -> Result<String, SignatureError> {
        let expires = expires_at.timestamp();
        let download = force_download.then_some(1);
        let signature = self.mac(key, expires, download);

        let mut url = self
            .base_url
            .join(key.as_str())
            .map_err(|e| SignatureError::Url(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("expires", &expires.to_string());
            if force_download {
                query.append_pair("download", "1");
            }
            query.append_pair("signature", signature.to_hex().as_str());
        }
        Ok(url.into())
    }

    /// Check a presented link for `key`.
    pub fn verify(&self, key: &StorageObjectKey, access: &SignedAccess) -> Result<(), SignatureError> {
        let presented =
            blake3::Hash::from_hex(access.signature.as_bytes()).map_err(|_| SignatureError::Invalid)?;

        // blake3::Hash equality is constant-time.
        if presented != self.mac(key, access.expires, access.download) {
            return Err(SignatureError::Invalid);
        }
        if self.clock.now().timestamp() >= access.expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    fn mac(&self, key: &StorageObjectKey, expires: i64, download: Option<u8>) -> blake3::Hash {
        let message = format!("{}\n{}\n{}", key, expires, download.unwrap_or(0));
        blake3::keyed_hash(&self.key, message.as_bytes())
    }
}
