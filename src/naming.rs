// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Storage key derivation from client-declared file names.
//!
//! Keys take the form `{epoch_millis}-{stem}.{extension}`. The timestamp
//! separates repeat uploads of the same name; two uploads of one name in the
//! same millisecond can still collide, and the store's non-overwrite `put`
//! is what catches that.

use crate::clock::Clock;
use crate::models::StorageObjectKey;
use std::sync::Arc;

/// Longest stem kept after sanitization, in bytes.
pub const MAX_STEM_LEN: usize = 128;

/// Longest extension kept after sanitization, in bytes.
pub const MAX_EXTENSION_LEN: usize = 16;

/// Upper bound on a derived key: a full `i64` timestamp, the stem, the
/// extension and their separators. Stays well under the 255-byte file name
/// limit even with the `.json` metadata suffix appended.
pub const MAX_KEY_LEN: usize = 20 + 1 + MAX_STEM_LEN + 1 + MAX_EXTENSION_LEN;

/// Stem used when sanitization leaves nothing.
const EMPTY_STEM: &str = "file";

/// Derives storage keys from declared names and the current time.
pub struct NameGenerator {
    clock: Arc<dyn Clock>,
}

impl NameGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Key for `declared_name` at the current instant.
    pub fn generate(&self, declared_name: &str) -> StorageObjectKey {
        key_for(declared_name, self.clock.now_millis())
    }
}

/// Key for `declared_name` at `millis`.
pub fn key_for(declared_name: &str, millis: i64) -> StorageObjectKey {
    let sanitized = sanitize(declared_name);

    let (stem, extension) = match sanitized.rfind('.') {
        Some(dot) => (&sanitized[..dot], Some(&sanitized[dot + 1..])),
        None => (sanitized.as_str(), None),
    };

    let stem = match &stem[..stem.len().min(MAX_STEM_LEN)] {
        "" => EMPTY_STEM,
        s => s,
    };

    let extension = extension.map(|ext| &ext[..ext.len().min(MAX_EXTENSION_LEN)]);

    match extension {
        Some(ext) if !ext.is_empty() => StorageObjectKey::new(format!("{millis}-{stem}.{ext}")),
        _ => StorageObjectKey::new(format!("{millis}-{stem}")),
    }
}

/// Strip characters outside `[A-Za-z0-9.\-_\s]`, collapse whitespace runs to
/// one hyphen and lower-case the result.
pub fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_space = false;
        }
    }
    out
}
