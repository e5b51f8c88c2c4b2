//! Catalog discovery handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use cs_core::MediaIdentifier;

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub videos: Vec<MediaIdentifier>,
}

/// GET /catalog (and the legacy GET /api/videos)
pub async fn list_catalog(State(ctx): State<AppContext>) -> Json<CatalogResponse> {
    let videos = ctx.catalog.list().await;
    tracing::debug!(available = videos.len(), "Catalog listed");
    Json(CatalogResponse { videos })
}
