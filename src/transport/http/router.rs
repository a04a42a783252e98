use crate::domain::entity::EntityKind;
use crate::domain::report::{SourceOutcome, SyncResult};
use crate::domain::source::{SourceStatus, SyncSource};
use crate::transport::http::handlers::{health, sync};
use crate::transport::http::types::{
    ApiResponse, AppState, ErrorResponse, ListSourcesResponse, RegisterSourceRequest,
    SourceResponse, SyncAllResponse, SyncSourceResponse,
};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(health::healthcheck_handler, sync::sync_handler),
    components(schemas(
        ApiResponse,
        ErrorResponse,
        RegisterSourceRequest,
        ListSourcesResponse,
        SourceResponse,
        SyncSourceResponse,
        SyncAllResponse,
        SyncSource,
        SourceStatus,
        SyncResult,
        SourceOutcome,
        EntityKind
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/api/sync",
            get(sync::sync_handler)
                .post(sync::sync_handler)
                .options(sync::preflight_handler),
        )
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
