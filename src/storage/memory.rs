// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process-local object store.

use super::{ObjectStore, PutOptions, SignOptions, StorageError, StoredObject, UrlSigner};
use crate::models::StorageObjectKey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Objects held in memory, lost on restart.
pub struct MemoryStore {
    objects: RwLock<HashMap<StorageObjectKey, StoredObject>>,
    signer: Arc<UrlSigner>,
}

impl MemoryStore {
    pub fn new(signer: Arc<UrlSigner>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            signer,
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, key: &StorageObjectKey) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &StorageObjectKey,
        bytes: &[u8],
        options: &PutOptions,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        if !options.overwrite && objects.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.clone()));
        }
        objects.insert(
            key.clone(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: options.content_type.clone(),
                cache_control: options.cache_control.clone(),
            },
        );
        Ok(())
    }

    async fn sign_url(
        &self,
        key: &StorageObjectKey,
        ttl: Duration,
        options: SignOptions,
    ) -> Result<String, StorageError> {
        self.signer
            .sign(key, ttl, options.force_download)
            .map_err(|e| StorageError::Signing(e.to_string()))
    }

    async fn get(&self, key: &StorageObjectKey) -> Result<StoredObject, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }

    async fn delete(&self, key: &StorageObjectKey) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.clone()))
    }
}
