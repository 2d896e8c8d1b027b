// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the PDF upload gateway.
//!
//! Defaults match the admission policy: five uploads per client per hour,
//! 5 MiB files, and access links valid for one year.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// One MiB in bytes.
pub const MIB: u64 = 1024 * 1024;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Invalid public base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Configuration for the upload gateway service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Upload validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Storage and link issuance configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum admitted uploads per client per window (default: 5)
    #[serde(default = "default_max_per_window")]
    pub max_per_window: u32,

    /// Window length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often expired windows are swept, in seconds (default: 300)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Content validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum file size in bytes (default: 5 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Accepted request content types
    #[serde(default = "default_request_content_types")]
    pub request_content_types: Vec<String>,
}

/// Which object store backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Filesystem,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "filesystem" | "fs" => Ok(Self::Filesystem),
            _ => Err(ConfigError::InvalidValue {
                var: "STORAGE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Storage and access grant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selection (default: filesystem)
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend (default: ./uploads)
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Base URL that signed links are rooted at
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Secret for link signatures. Generated at startup when absent.
    #[serde(default, skip_serializing)]
    pub signing_secret: Option<String>,

    /// Validity horizon of issued links in seconds (default: one year)
    #[serde(default = "default_grant_ttl_secs")]
    pub grant_ttl_secs: u64,

    /// Cache-Control value stored with each object (default: 3600)
    #[serde(default = "default_cache_control")]
    pub cache_control: String,

    /// Delete the stored object when link issuance fails (default: false)
    #[serde(default)]
    pub compensate_orphans: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_per_window() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_max_file_size() -> u64 {
    5 * MIB
}

fn default_request_content_types() -> Vec<String> {
    vec![
        "application/json".to_string(),
        "multipart/form-data".to_string(),
    ]
}

fn default_backend() -> StorageBackend {
    StorageBackend::Filesystem
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/files/".to_string()
}

fn default_grant_ttl_secs() -> u64 {
    365 * 24 * 60 * 60
}

fn default_cache_control() -> String {
    "3600".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            storage: StorageConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_window: default_max_per_window(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            request_content_types: default_request_content_types(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root_dir: default_root_dir(),
            public_base_url: default_public_base_url(),
            signing_secret: None,
            grant_ttl_secs: default_grant_ttl_secs(),
            cache_control: default_cache_control(),
            compensate_orphans: false,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the cleanup sweep interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl ValidationConfig {
    /// Largest request body that can carry a maximum-size file.
    ///
    /// Base64 inflates by 4/3; the rest covers the JSON envelope.
    pub fn request_body_limit(&self) -> usize {
        let encoded = self.max_file_size.div_ceil(3) * 4;
        usize::try_from(encoded + 64 * 1024).unwrap_or(usize::MAX)
    }
}

impl StorageConfig {
    /// Get the link validity horizon
    pub fn grant_ttl(&self) -> Duration {
        Duration::from_secs(self.grant_ttl_secs)
    }
}

impl Config {
    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let config = Config {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            rate_limit: RateLimitConfig {
                max_per_window: env_parse("MAX_UPLOADS_PER_WINDOW")?
                    .unwrap_or(defaults.rate_limit.max_per_window),
                window_secs: env_parse("RATE_WINDOW_SECS")?
                    .unwrap_or(defaults.rate_limit.window_secs),
                cleanup_interval_secs: env_parse("RATE_CLEANUP_INTERVAL_SECS")?
                    .unwrap_or(defaults.rate_limit.cleanup_interval_secs),
            },
            validation: ValidationConfig {
                max_file_size: env_parse("MAX_FILE_SIZE_BYTES")?
                    .unwrap_or(defaults.validation.max_file_size),
                ..defaults.validation
            },
            storage: StorageConfig {
                backend: env_parse("STORAGE_BACKEND")?.unwrap_or(defaults.storage.backend),
                root_dir: std::env::var("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.root_dir),
                public_base_url: std::env::var("PUBLIC_BASE_URL")
                    .unwrap_or(defaults.storage.public_base_url),
                signing_secret: std::env::var("URL_SIGNING_SECRET")
                    .ok()
                    .filter(|s| !s.is_empty()),
                grant_ttl_secs: env_parse("GRANT_TTL_SECS")?
                    .unwrap_or(defaults.storage.grant_ttl_secs),
                cache_control: std::env::var("CACHE_CONTROL")
                    .unwrap_or(defaults.storage.cache_control),
                compensate_orphans: env_parse("COMPENSATE_ORPHANS")?
                    .unwrap_or(defaults.storage.compensate_orphans),
            },
            metrics: MetricsConfig {
                enabled: env_parse("METRICS_ENABLED")?.unwrap_or(defaults.metrics.enabled),
                ..defaults.metrics
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the gateway admit nothing or issue
    /// unusable links.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.max_per_window == 0 {
            return Err(ConfigError::Zero("MAX_UPLOADS_PER_WINDOW"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Zero("RATE_WINDOW_SECS"));
        }
        if self.rate_limit.cleanup_interval_secs == 0 {
            return Err(ConfigError::Zero("RATE_CLEANUP_INTERVAL_SECS"));
        }
        if self.validation.max_file_size == 0 {
            return Err(ConfigError::Zero("MAX_FILE_SIZE_BYTES"));
        }
        if self.storage.grant_ttl_secs == 0 {
            return Err(ConfigError::Zero("GRANT_TTL_SECS"));
        }
        // Keep chrono arithmetic on window and grant horizons in range.
        const HUNDRED_YEARS: u64 = 100 * 365 * 24 * 60 * 60;
        if self.rate_limit.window_secs > HUNDRED_YEARS {
            return Err(ConfigError::InvalidValue {
                var: "RATE_WINDOW_SECS",
                value: self.rate_limit.window_secs.to_string(),
            });
        }
        if self.storage.grant_ttl_secs > HUNDRED_YEARS {
            return Err(ConfigError::InvalidValue {
                var: "GRANT_TTL_SECS",
                value: self.storage.grant_ttl_secs.to_string(),
            });
        }

        Url::parse(&self.storage.public_base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.storage.public_base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// The configured signing secret, or a fresh random one.
    ///
    /// Links signed with a generated secret stop verifying once the process
    /// exits.
    pub fn signing_secret(&self) -> String {
        match &self.storage.signing_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("URL_SIGNING_SECRET not set, generating an ephemeral secret");
                hex::encode(rand::random::<[u8; 32]>())
            }
        }
    }
}

/// Parse an optional environment variable, rejecting malformed values.
fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        _ => Ok(None),
    }
}
