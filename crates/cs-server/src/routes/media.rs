//! Media streaming handler: resolve, parse the range, plan, then stream.
//!
//! Resolution and range errors are answered with a complete status before
//! any file is opened. Once the descriptor is committed, failures can only
//! cut the body short.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::Response;
use axum::Extension;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::planner;
use crate::range;
use crate::transport::StreamSession;

/// GET /media/{identifier}
///
/// Also mounted at `/api/video/{identifier}` for the legacy frontend.
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(identifier): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    respond(&ctx, &identifier, &method, &headers)
        .await
        .map_err(|e| AppError::from(e).with_request_id(request_id.0))
}

async fn respond(
    ctx: &AppContext,
    identifier: &str,
    method: &Method,
    headers: &HeaderMap,
) -> cs_core::Result<Response> {
    let location = ctx.resolver.resolve(identifier).await?;

    let raw_range = headers.get(header::RANGE).map(|v| v.to_str());
    let parsed = match raw_range {
        None => Ok(None),
        Some(Ok(value)) => range::parse(Some(value), location.size()),
        Some(Err(_)) => Err(range::RangeError::Malformed("header is not visible ASCII")),
    };

    let descriptor = match parsed {
        Ok(range) => planner::plan(&location, range),
        Err(reason) => {
            tracing::debug!(
                identifier = %location.identifier(),
                raw = ?headers.get(header::RANGE),
                total = location.size(),
                %reason,
                "Unsatisfiable range"
            );
            planner::plan_unsatisfiable(&location)
        }
    };

    let body = match descriptor.range() {
        Some(range) if *method != Method::HEAD => {
            let session =
                StreamSession::open(&location, range, ctx.chunk_size(), &ctx.active_streams)
                    .await
                    .map_err(|e| {
                        // Raced with a delete or permission change since the lookup.
                        tracing::debug!(identifier = %location.identifier(), error = %e, "Open failed");
                        cs_core::Error::not_found("media", location.identifier())
                    })?;
            tracing::debug!(
                identifier = %location.identifier(),
                status = descriptor.status().as_u16(),
                range = %range,
                "Streaming media"
            );
            session.into_body()
        }
        _ => Body::empty(),
    };

    Ok(descriptor.into_response(body))
}
