// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Upload content validator.
//!
//! Implements admission checks for submitted files:
//! - Request Content-Type validation (transport level)
//! - Size ceiling on both the declared and the decoded length
//! - PDF magic number
//!
//! The client-declared content type of the file itself is never consulted.
//! Only the leading bytes decide whether a payload is a PDF.

use crate::config::ValidationConfig;
use crate::models::UploadCandidate;
use thiserror::Error;
use tracing::debug;

/// Leading bytes of every PDF document.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid Content-Type: expected one of {expected:?}, got {actual:?}")]
    UnsupportedContentType {
        expected: Vec<String>,
        actual: Option<String>,
    },

    #[error("File too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Content does not start with the PDF magic number")]
    NotAPdf,
}

/// Result of validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Upload is acceptable
    Valid,
    /// Upload is rejected
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(e) => Err(e),
        }
    }
}

/// Upload content validator.
pub struct ContentValidator {
    config: ValidationConfig,
}

impl ContentValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }

    /// Validate the request's Content-Type header.
    pub fn validate_content_type(&self, content_type: Option<&str>) -> ValidationResult {
        let ct = content_type.map(|s| {
            // Extract just the media type, ignoring charset and boundary
            s.split(';').next().unwrap_or(s).trim().to_lowercase()
        });

        let accepted = ct.as_deref().is_some_and(|actual| {
            self.config
                .request_content_types
                .iter()
                .any(|expected| expected.eq_ignore_ascii_case(actual))
        });

        if accepted {
            debug!(content_type = ?ct, "Content-Type valid");
            ValidationResult::Valid
        } else {
            debug!(content_type = ?ct, expected = ?self.config.request_content_types, "Content-Type invalid");
            ValidationResult::Invalid(ValidationError::UnsupportedContentType {
                expected: self.config.request_content_types.clone(),
                actual: ct,
            })
        }
    }

    /// Validate an upload, stopping at the first failed check.
    pub fn validate(&self, candidate: &UploadCandidate) -> ValidationResult {
        let result = self.validate_size(candidate);
        if !result.is_valid() {
            return result;
        }
        self.validate_magic(&candidate.bytes)
    }

    /// Enforce the size ceiling on both the declared and the actual length.
    pub fn validate_size(&self, candidate: &UploadCandidate) -> ValidationResult {
        let max = self.config.max_file_size;
        let size = candidate.declared_size.max(candidate.actual_size());

        if size > max {
            debug!(
                declared = candidate.declared_size,
                actual = candidate.actual_size(),
                max,
                "Upload exceeds size limit"
            );
            return ValidationResult::Invalid(ValidationError::FileTooLarge { size, max });
        }
        ValidationResult::Valid
    }

    /// Check the PDF magic number.
    pub fn validate_magic(&self, bytes: &[u8]) -> ValidationResult {
        if bytes.starts_with(PDF_MAGIC) {
            ValidationResult::Valid
        } else {
            debug!(
                leading = ?&bytes[..bytes.len().min(PDF_MAGIC.len())],
                "Upload is not a PDF"
            );
            ValidationResult::Invalid(ValidationError::NotAPdf)
        }
    }
}
