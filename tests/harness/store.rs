// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Object store double that counts calls and fails on demand.

use async_trait::async_trait;
use pdf_upload_gateway::models::StorageObjectKey;
use pdf_upload_gateway::storage::{
    MemoryStore, ObjectStore, PutOptions, SignOptions, StorageError, StoredObject, UrlSigner,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wraps a [`MemoryStore`], recording every call.
pub struct RecordingStore {
    inner: MemoryStore,
    pub put_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    fail_put: AtomicBool,
    /// Fail the sign call with this 1-based index (0 = never)
    fail_sign_at: AtomicUsize,
    fail_delete: AtomicBool,
    put_options: Mutex<Vec<PutOptions>>,
    sign_options: Mutex<Vec<(Duration, SignOptions)>>,
}

impl RecordingStore {
    pub fn new(signer: Arc<UrlSigner>) -> Self {
        Self {
            inner: MemoryStore::new(signer),
            put_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_put: AtomicBool::new(false),
            fail_sign_at: AtomicUsize::new(0),
            fail_delete: AtomicBool::new(false),
            put_options: Mutex::new(Vec::new()),
            sign_options: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Make the `n`th sign call from now on fail (1 = the next one).
    pub fn fail_sign_call(&self, n: usize) {
        let already = self.sign_calls.load(Ordering::SeqCst);
        self.fail_sign_at.store(already + n, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn puts(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn signs(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn last_put_options(&self) -> Option<PutOptions> {
        self.put_options.lock().unwrap().last().cloned()
    }

    pub fn sign_requests(&self) -> Vec<(Duration, SignOptions)> {
        self.sign_options.lock().unwrap().clone()
    }

    pub async fn object_count(&self) -> usize {
        self.inner.len().await
    }

    pub async fn contains(&self, key: &StorageObjectKey) -> bool {
        self.inner.contains(key).await
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put(
        &self,
        key: &StorageObjectKey,
        bytes: &[u8],
        options: &PutOptions,
    ) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.put_options.lock().unwrap().push(options.clone());
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected put failure".to_string()));
        }
        self.inner.put(key, bytes, options).await
    }

    async fn sign_url(
        &self,
        key: &StorageObjectKey,
        ttl: Duration,
        options: SignOptions,
    ) -> Result<String, StorageError> {
        let n = self.sign_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.sign_options.lock().unwrap().push((ttl, options));
        if self.fail_sign_at.load(Ordering::SeqCst) == n {
            return Err(StorageError::Signing("injected signing failure".to_string()));
        }
        self.inner.sign_url(key, ttl, options).await
    }

    async fn get(&self, key: &StorageObjectKey) -> Result<StoredObject, StorageError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &StorageObjectKey) -> Result<(), StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected delete failure".to_string()));
        }
        self.inner.delete(key).await
    }
}
