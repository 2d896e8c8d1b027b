// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Filesystem-backed object store.
//!
//! Layout under the root directory:
//! - `objects/{key}`: object bytes
//! - `meta/{key}.json`: content type and cache control

use super::{ObjectStore, PutOptions, SignOptions, StorageError, StoredObject, UrlSigner};
use crate::models::StorageObjectKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: String,
    cache_control: String,
}

/// Objects stored as files under a root directory.
pub struct FsStore {
    objects_dir: PathBuf,
    meta_dir: PathBuf,
    signer: Arc<UrlSigner>,
}

impl FsStore {
    /// Open the store, creating its directories if needed.
    pub async fn open(root: impl AsRef<Path>, signer: Arc<UrlSigner>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        let objects_dir = root.join("objects");
        let meta_dir = root.join("meta");
        fs::create_dir_all(&objects_dir).await?;
        fs::create_dir_all(&meta_dir).await?;
        debug!(root = %root.display(), "Opened filesystem object store");

        Ok(Self {
            objects_dir,
            meta_dir,
            signer,
        })
    }

    fn object_path(&self, key: &StorageObjectKey) -> Result<PathBuf, StorageError> {
        if !key.is_path_safe() {
            return Err(StorageError::InvalidKey(key.clone()));
        }
        Ok(self.objects_dir.join(key.as_str()))
    }

    fn meta_path(&self, key: &StorageObjectKey) -> PathBuf {
        self.meta_dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn put(
        &self,
        key: &StorageObjectKey,
        bytes: &[u8],
        options: &PutOptions,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.overwrite {
            open.create(true).truncate(true);
        } else {
            // Atomic existence check: fails if another writer got there first.
            open.create_new(true);
        }

        let mut file = match open.open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await?;
            let meta = serde_json::to_vec(&ObjectMeta {
                content_type: options.content_type.clone(),
                cache_control: options.cache_control.clone(),
            })?;
            fs::write(self.meta_path(key), meta).await?;
            Ok::<_, StorageError>(())
        }
        .await;

        if let Err(e) = written {
            // Do not leave a half-written object claiming the key.
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(key = %key, error = %cleanup, "Failed to remove partial object");
            }
            return Err(e);
        }
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
        let path = self.object_path(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let meta: ObjectMeta = serde_json::from_slice(&fs::read(self.meta_path(key)).await?)?;

        Ok(StoredObject {
            bytes,
            content_type: meta.content_type,
            cache_control: meta.cache_control,
        })
    }

    async fn delete(&self, key: &StorageObjectKey) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        if let Err(e) = fs::remove_file(self.meta_path(key)).await {
            if e.kind() != ErrorKind::NotFound {
                return Err(e.into());
            }
        }
        Ok(())
    }
}
