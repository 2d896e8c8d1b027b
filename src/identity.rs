// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identity for rate-limit accounting.
//!
//! Uploaders are anonymous, so the only handle on a caller is the address
//! reported by the fronting proxy. Callers that cannot be identified all
//! collapse onto the shared [`UNKNOWN_CLIENT`] key and therefore share one
//! budget.

use axum::http::{HeaderMap, HeaderName};
use std::fmt;

/// Sentinel key for callers with no usable address header.
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Opaque per-caller identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CLIENT.to_string())
    }

    /// Derive the key from request headers.
    ///
    /// Preference: first entry of `X-Forwarded-For`, then `X-Real-IP`, then
    /// the shared sentinel.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get(&X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get(&X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        forwarded
            .or_else(real_ip)
            .map(Self::new)
            .unwrap_or_else(Self::unknown)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_CLIENT
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
