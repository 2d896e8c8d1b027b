// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for upload attempts.
//!
//! Each client key owns one [`RateWindow`]. A window opens on the first
//! admitted request (count 1), admits until `max_per_window` is reached and
//! is replaced wholesale once `reset_at` passes.
//!
//! Windows live only in process memory; a restart forgets every budget.
//!
//! Per-key admission runs under that key's own mutex so concurrent requests
//! from one client cannot both observe spare budget. The outer map lock is
//! only held to find or insert a key's slot, so distinct clients never wait
//! on each other's windows.

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::identity::ClientKey;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Admissions left in the current window
        remaining: u32,
        /// When the current window closes
        reset_at: DateTime<Utc>,
    },
    /// Window budget is spent
    Limited {
        /// Time until the window closes
        retry_after: Duration,
        /// When the current window closes
        reset_at: DateTime<Utc>,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Admission counter for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

type Slot = Arc<Mutex<Option<RateWindow>>>;

/// Thread-safe fixed-window rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Per-client windows
    windows: RwLock<HashMap<ClientKey, Slot>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Admit or refuse one attempt for `key`.
    pub async fn admit(&self, key: &ClientKey) -> bool {
        self.check(key).await.is_allowed()
    }

    /// Admit or refuse one attempt, reporting the remaining budget.
    pub async fn check(&self, key: &ClientKey) -> RateLimitResult {
        let slot = self.slot(key).await;
        let mut window = slot.lock().await;
        let now = self.clock.now();
        let max = self.config.max_per_window;

        match window.as_mut() {
            Some(current) if now < current.reset_at => {
                if current.count >= max {
                    let retry_after = (current.reset_at - now).to_std().unwrap_or_default();
                    debug!(client = %key, ?retry_after, "Upload budget exhausted");
                    return RateLimitResult::Limited {
                        retry_after,
                        reset_at: current.reset_at,
                    };
                }
                current.count += 1;
                RateLimitResult::Allowed {
                    remaining: max - current.count,
                    reset_at: current.reset_at,
                }
            }
            _ => {
                let reset_at = now + self.window_length();
                *window = Some(RateWindow { count: 1, reset_at });
                debug!(client = %key, %reset_at, "Opened rate window");
                RateLimitResult::Allowed {
                    remaining: max.saturating_sub(1),
                    reset_at,
                }
            }
        }
    }

    /// Snapshot of the window currently held for `key`.
    pub async fn window(&self, key: &ClientKey) -> Option<RateWindow> {
        let slot = self.windows.read().await.get(key).cloned()?;
        let window = slot.lock().await;
        *window
    }

    /// Number of keys with a tracked window.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Drop expired windows (should be called periodically).
    ///
    /// A slot that some request still holds is kept even when expired, so a
    /// key never has two live windows.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.write().await;
        let before = windows.len();

        windows.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(window) => matches!(*window, Some(w) if now < w.reset_at),
                Err(_) => true,
            }
        });

        let removed = before - windows.len();
        if removed > 0 {
            debug!(removed, remaining = windows.len(), "Swept expired rate windows");
        }
        removed
    }

    fn window_length(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.window_duration())
            .unwrap_or_else(|_| chrono::Duration::seconds(i64::from(u32::MAX)))
    }

    async fn slot(&self, key: &ClientKey) -> Slot {
        if let Some(slot) = self.windows.read().await.get(key) {
            return slot.clone();
        }
        self.windows
            .write()
            .await
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }
}
