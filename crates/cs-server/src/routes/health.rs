//! Health endpoint. Reads process state only.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub root: String,
    pub active_streams: usize,
}

/// GET /health (and the legacy GET /api/health)
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        root: ctx.resolver.root().display().to_string(),
        active_streams: ctx.active_streams.current(),
    })
}
