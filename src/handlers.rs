// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the PDF upload gateway.
//!
//! `POST /api/upload` takes a JSON envelope with the base64 file body and
//! answers with a pair of signed links. `GET /files/:key` redeems those
//! links.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{AccessError, UploadError};
use crate::gateway::UploadGateway;
use crate::identity::ClientKey;
use crate::metrics::GatewayMetrics;
use crate::models::{StorageObjectKey, UploadCandidate};
use crate::storage::{ObjectStore, SignatureError, SignedAccess, UrlSigner};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// Shared application state.
pub struct AppState {
    pub gateway: UploadGateway,
    pub store: Arc<dyn ObjectStore>,
    pub signer: Arc<UrlSigner>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ObjectStore>,
        signer: Arc<UrlSigner>,
        clock: Arc<dyn Clock>,
        metrics: GatewayMetrics,
    ) -> Self {
        Self {
            gateway: UploadGateway::new(&config, store.clone(), clock, metrics),
            store,
            signer,
            config,
        }
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        self.gateway.metrics()
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.validation.request_body_limit();

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/upload", post(upload).fallback(method_not_allowed))
        .route("/files/:key", get(serve_file));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Upload request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub file_data: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Upload success response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub file: FileLinks,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLinks {
    pub name: String,
    pub url: String,
    pub download_url: String,
    pub expires_at: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdf-upload-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Accept one PDF upload and answer with its access links.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let client = ClientKey::from_headers(&headers);

    let parsed = body
        .map_err(|rejection| body_rejection(&state, rejection))
        .and_then(|body| parse_upload(&state, &headers, &body));

    let result = match parsed {
        Ok(candidate) => state.gateway.handle(candidate, &client).await,
        Err(e) => {
            info!(client = %client, error = %e, "Upload request rejected before admission");
            Err(e)
        }
    };

    state
        .metrics()
        .set_rate_limit_windows(state.gateway.limiter().tracked_keys().await);

    match result {
        Ok(grant) => {
            state.metrics().record_outcome("success");
            Json(UploadResponse {
                message: "File uploaded successfully",
                file: FileLinks {
                    name: grant.key.to_string(),
                    url: grant.view_url,
                    download_url: grant.download_url,
                    expires_at: grant.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                },
            })
            .into_response()
        }
        Err(e) => {
            state.metrics().record_outcome(e.outcome());
            e.into_response()
        }
    }
}

/// Map a body extraction failure onto the upload taxonomy.
fn body_rejection(state: &AppState, rejection: BytesRejection) -> UploadError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let max = state.gateway.validator().max_file_size();
        UploadError::FileTooLarge {
            size: state.config.validation.request_body_limit() as u64,
            max,
        }
    } else {
        UploadError::MalformedRequest(rejection.body_text())
    }
}

/// Turn the transport envelope into an upload candidate.
fn parse_upload(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<UploadCandidate, UploadError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    state
        .gateway
        .validator()
        .validate_content_type(content_type)
        .into_result()?;

    let request: UploadRequest = serde_json::from_slice(body)
        .map_err(|e| UploadError::MalformedRequest(format!("invalid JSON body: {e}")))?;

    let (file_data, file_name) = match (request.file_data, request.file_name) {
        (Some(data), Some(name)) if !data.is_empty() && !name.is_empty() => (data, name),
        _ => {
            return Err(UploadError::MalformedRequest(
                "fileData and fileName are required".to_string(),
            ))
        }
    };

    let (declared_content_type, encoded) = split_data_url(&file_data);
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| UploadError::MalformedRequest(format!("invalid base64 fileData: {e}")))?;

    debug!(
        file_name = %file_name,
        declared_size = ?request.file_size,
        decoded_size = bytes.len(),
        "Parsed upload request"
    );

    Ok(UploadCandidate {
        declared_size: request.file_size.unwrap_or(bytes.len() as u64),
        bytes,
        declared_name: file_name,
        declared_content_type: declared_content_type.unwrap_or_default().to_string(),
    })
}

/// Split an optional `data:<mime>;base64,` prefix off the payload.
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((meta, payload)) => (meta.strip_suffix(";base64").or(Some(meta)), payload),
        None => (None, data),
    }
}

/// Turn a handler panic into the generic internal error.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());
    error!(detail = %detail, "Request handler panicked");
    UploadError::Internal(detail).into_response()
}

/// Reject every method except POST on the upload route.
pub async fn method_not_allowed() -> Response {
    UploadError::MethodNotAllowed.into_response()
}

/// Redeem a signed link.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    access: Result<Query<SignedAccess>, QueryRejection>,
) -> Result<Response, AccessError> {
    let key = StorageObjectKey::new(key);
    let Query(access) = access.map_err(|e| {
        debug!(key = %key, error = %e, "Rejected file link without signature");
        AccessError::Signature(SignatureError::Invalid)
    })?;
    state.signer.verify(&key, &access).inspect_err(|e| {
        debug!(key = %key, error = %e, "Rejected file link");
    })?;

    let object = state.store.get(&key).await.inspect_err(|e| {
        error!(key = %key, error = %e, "Failed to read stored object");
    })?;

    let disposition = if access.force_download() {
        format!("attachment; filename=\"{key}\"")
    } else {
        format!("inline; filename=\"{key}\"")
    };

    let mut response = (StatusCode::OK, object.bytes).into_response();
    let headers = response.headers_mut();
    for (name, value) in [
        (header::CONTENT_TYPE, object.content_type),
        (header::CACHE_CONTROL, object.cache_control),
        (header::CONTENT_DISPOSITION, disposition),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
    Ok(response)
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics().encode_text() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
