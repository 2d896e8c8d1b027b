// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! PDF Upload Gateway
//!
//! This crate admits anonymous PDF uploads and exchanges them for signed,
//! time-limited access links:
//!
//! - Per-client fixed-window rate limiting (5 uploads per hour default)
//! - PDF magic-number and size validation
//! - Sanitized, timestamp-prefixed storage keys
//! - Non-overwriting object writes
//! - Paired view and download links valid for one year

pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod identity;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod naming;
pub mod storage;
pub mod validator;

pub use config::Config;
pub use error::UploadError;
pub use gateway::UploadGateway;
pub use identity::ClientKey;
pub use limiter::{RateLimitResult, RateLimiter};
pub use validator::{ContentValidator, ValidationResult};
