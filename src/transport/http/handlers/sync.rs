use crate::transport::http::types::{
    ApiError, AppState, ListSourcesResponse, RegisterSourceRequest,
    SourceResponse, SyncAllResponse, SyncQuery, SyncSourceResponse,
};
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/sync",
    params(SyncQuery),
    request_body(content = Option<RegisterSourceRequest>, description = "Body for `action=register` (POST only)"),
    responses(
        (status = 200, description = "`list` -> ListSourcesResponse, `register`/`status` -> SourceResponse, `sync` -> SyncSourceResponse, `sync-all` -> SyncAllResponse"),
        (status = 405, description = "`register` over a method other than POST", body = crate::transport::http::types::ErrorResponse),
        (status = 500, description = "Unknown action, missing parameter or failed sync", body = crate::transport::http::types::ErrorResponse)
    )
)]
pub async fn sync_handler(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<SyncQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let action = query.action.as_deref().unwrap_or("").trim();
    tracing::debug!(action, method = %method, "sync endpoint");
    let registry = state.coordinator.registry();

    match action {
        "list" => {
            let sources = registry.list().await?;
            Ok(Json(ListSourcesResponse {
                success: true,
                sources,
            })
            .into_response())
        }
        "register" => {
            if method != Method::POST {
                return Err(ApiError::MethodNotAllowed {
                    action: action.to_string(),
                    method: method.to_string(),
                });
            }
            let request = parse_register_body(&body)?;
            let source = registry
                .register(
                    request.app_name.as_deref(),
                    request.app_url.as_deref(),
                    request.export_endpoint.as_deref(),
                )
                .await?;
            Ok(Json(SourceResponse {
                success: true,
                source,
            })
            .into_response())
        }
        "status" => {
            let id = source_id(&query)?;
            let source = registry.get(id).await?;
            Ok(Json(SourceResponse {
                success: true,
                source,
            })
            .into_response())
        }
        "sync" => {
            let id = source_id(&query)?;
            let report = state.coordinator.sync_source(id).await?;
            Ok(Json(SyncSourceResponse {
                success: true,
                source: report.source,
                results: report.results,
                synced_at: report.synced_at,
            })
            .into_response())
        }
        "sync-all" => {
            let report = state.coordinator.sync_all().await?;
            Ok(Json(SyncAllResponse {
                success: true,
                synced_sources: report.synced_sources,
                results: report.results,
                synced_at: report.synced_at,
            })
            .into_response())
        }
        other => Err(ApiError::UnknownAction(other.to_string())),
    }
}

/// Empty 200 for `OPTIONS`; the CORS layer supplies the headers.
pub async fn preflight_handler() -> impl IntoResponse {
    StatusCode::OK
}

fn source_id(query: &SyncQuery) -> Result<Uuid, ApiError> {
    let raw = query
        .source_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingParameter("source_id"))?;
    Uuid::parse_str(raw).map_err(|e| ApiError::InvalidParameter {
        name: "source_id",
        message: e.to_string(),
    })
}

/// An empty body is a registration with every field missing.
fn parse_register_body(body: &[u8]) -> Result<RegisterSourceRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RegisterSourceRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}
