// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Data passed between the gateway stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A submitted file, alive for the duration of one request.
///
/// Everything except `bytes` is declared by the client and therefore
/// untrusted.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub bytes: Vec<u8>,
    pub declared_name: String,
    pub declared_size: u64,
    pub declared_content_type: String,
}

impl UploadCandidate {
    /// Actual length of the decoded payload.
    pub fn actual_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Key under which an object is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageObjectKey(String);

impl StorageObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is usable as a single path segment.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
    }
}

impl fmt::Display for StorageObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-bounded access links for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub key: StorageObjectKey,
    pub view_url: String,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}
