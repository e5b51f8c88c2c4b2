//! Axum router construction.

use axum::http::header;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors_enabled = ctx.config.server.cors;

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/catalog", get(routes::catalog::list_catalog))
        .route("/media/{identifier}", get(routes::media::stream_media))
        // Paths the legacy browser frontend still requests.
        .nest("/api", legacy_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http());

    let app = if cors_enabled {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([
                    header::CONTENT_RANGE,
                    header::CONTENT_LENGTH,
                    header::ACCEPT_RANGES,
                ]),
        )
    } else {
        app
    };

    app.with_state(ctx)
}

fn legacy_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/videos", get(routes::catalog::list_catalog))
        .route("/video/{identifier}", get(routes::media::stream_media))
}
