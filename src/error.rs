// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the upload gateway.
//!
//! Callers only ever see the fixed message for a rejection category. The
//! wrapped collaborator errors are for logs.

use crate::config::MIB;
use crate::storage::{SignatureError, StorageError};
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Rejections of an upload attempt. All are final for the request.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("File too large: {size} bytes exceeds {max}")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Content is not a PDF")]
    NotAPdf,

    #[error("Rate limit exceeded, retry in {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(#[source] StorageError),

    #[error("Access link issuance failed: {0}")]
    GrantIssuanceFailed(#[source] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// HTTP status for this rejection category.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedRequest(_) | Self::FileTooLarge { .. } | Self::NotAPdf => {
                StatusCode::BAD_REQUEST
            }
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::StorageWriteFailed(_) | Self::GrantIssuanceFailed(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::MalformedRequest(_) => "Missing or invalid file data".to_string(),
            Self::FileTooLarge { max, .. } => format!(
                "File too large. Maximum size is {}",
                human_size(*max)
            ),
            Self::NotAPdf => "Invalid PDF file".to_string(),
            Self::RateLimited { .. } => "Too many uploads. Please try again later.".to_string(),
            Self::StorageWriteFailed(_) => "Upload failed".to_string(),
            Self::GrantIssuanceFailed(_) => "Failed to generate file links".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Metric label for this rejection category.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MalformedRequest(_) => "malformed_request",
            Self::FileTooLarge { .. } => "file_too_large",
            Self::NotAPdf => "not_a_pdf",
            Self::RateLimited { .. } => "rate_limited",
            Self::StorageWriteFailed(_) => "storage_write_failed",
            Self::GrantIssuanceFailed(_) => "grant_issuance_failed",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<ValidationError> for UploadError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => Self::FileTooLarge { size, max },
            ValidationError::NotAPdf => Self::NotAPdf,
            e @ ValidationError::UnsupportedContentType { .. } => {
                Self::MalformedRequest(e.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.public_message(),
        });
        match self {
            Self::RateLimited { retry_after } => {
                // Round up so clients never retry before the window closes.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, secs.to_string())],
                    body,
                )
                    .into_response()
            }
            other => (other.status(), body).into_response(),
        }
    }
}

/// Failures when redeeming a signed link.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Link rejected: {0}")]
    Signature(#[from] SignatureError),

    #[error("Object not found")]
    NotFound,

    #[error("Storage read failed: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for AccessError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidKey(_) => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Signature(SignatureError::Expired) => (StatusCode::FORBIDDEN, "Link has expired"),
            Self::Signature(_) => (StatusCode::FORBIDDEN, "Invalid link"),
            Self::NotFound => (StatusCode::NOT_FOUND, "File not found"),
            Self::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

fn human_size(bytes: u64) -> String {
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
