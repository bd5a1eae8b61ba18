mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use self::state::*;

#[derive(OpenApi)]
#[openapi(
    paths(api::field_chunk_handler, api::field_chunks_handler),
    components(schemas(
        types::FieldChunksRequest,
        types::ChunkCoord,
        types::ArtworkPayload,
    ))
)]
pub struct ApiDoc;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/artworks/field-chunk", get(api::field_chunk_handler))
        .route("/api/artworks/field-chunks", post(api::field_chunks_handler))
        .route("/metrics", get(api::metrics_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // 请求体限制：1M
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state)
}
