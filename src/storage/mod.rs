// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Object storage collaborator.
//!
//! The gateway only needs four capabilities from a bucket: write an object
//! without clobbering an existing one, mint a time-limited link to it, read
//! it back for link holders, and delete it.

mod fs;
mod memory;
mod signer;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use signer::{SignatureError, SignedAccess, UrlSigner};

use crate::models::StorageObjectKey;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object already exists: {0}")]
    AlreadyExists(StorageObjectKey),

    #[error("Object not found: {0}")]
    NotFound(StorageObjectKey),

    #[error("Key is not usable as an object name: {0}")]
    InvalidKey(StorageObjectKey),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Options for writing an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: String,
    pub cache_control: String,
    /// Replace an existing object instead of failing
    pub overwrite: bool,
}

/// Options for minting a signed link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Ask the link holder's client to save rather than display the object
    pub force_download: bool,
}

/// A stored object with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

/// Object storage capability consumed by the gateway.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`.
    ///
    /// With `overwrite: false` this must fail with
    /// [`StorageError::AlreadyExists`] when the key is taken.
    async fn put(
        &self,
        key: &StorageObjectKey,
        bytes: &[u8],
        options: &PutOptions,
    ) -> Result<(), StorageError>;

    /// Mint a link to `key` valid for `ttl`.
    async fn sign_url(
        &self,
        key: &StorageObjectKey,
        ttl: Duration,
        options: SignOptions,
    ) -> Result<String, StorageError>;

    async fn get(&self, key: &StorageObjectKey) -> Result<StoredObject, StorageError>;

    async fn delete(&self, key: &StorageObjectKey) -> Result<(), StorageError>;
}
