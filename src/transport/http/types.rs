use crate::app::{SyncCoordinator, SyncError};
use crate::domain::report::{SourceOutcome, SyncResult};
use crate::domain::source::SyncSource;
use crate::storage::SyncStore;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SyncCoordinator>,
    pub store: Arc<dyn SyncStore>,
}

impl AppState {
    pub fn new(coordinator: Arc<SyncCoordinator>, store: Arc<dyn SyncStore>) -> Self {
        Self { coordinator, store }
    }
}

#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SyncQuery {
    /// One of `list`, `register`, `status`, `sync`, `sync-all`.
    pub action: Option<String>,
    /// Required by `status` and `sync`.
    pub source_id: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default, ToSchema)]
pub struct RegisterSourceRequest {
    pub app_name: Option<String>,
    pub app_url: Option<String>,
    /// Defaults to `/api/export`.
    #[serde(default)]
    pub export_endpoint: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ListSourcesResponse {
    pub success: bool,
    pub sources: Vec<SyncSource>,
}

/// Returned by `register` and `status`.
#[derive(Serialize, Debug, ToSchema)]
pub struct SourceResponse {
    pub success: bool,
    pub source: SyncSource,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SyncSourceResponse {
    pub success: bool,
    /// Source app name.
    pub source: String,
    pub results: Vec<SyncResult>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SyncAllResponse {
    pub success: bool,
    pub synced_sources: usize,
    pub results: Vec<SourceOutcome>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("Invalid {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("Method {method} not allowed for action '{action}'")]
    MethodNotAllowed { action: String, method: String },

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "sync request failed");
        (
            self.status(),
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
