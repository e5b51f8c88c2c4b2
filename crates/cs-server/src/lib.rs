//! cs-server: HTTP range-request media server.
//!
//! Serves files from one configured root with byte-range support:
//!
//! - [`resolver`] maps untrusted identifiers onto files under the root
//! - [`range`] parses the `Range` header into a satisfiable [`cs_core::ByteRange`]
//! - [`planner`] decides status and headers
//! - [`transport`] streams the planned bytes in bounded chunks
//! - [`catalog`] lists which known identifiers currently exist
//!
//! Every connection runs on its own task with an idle timeout, so one stalled
//! client cannot hold a file handle or delay anyone else.

pub mod catalog;
pub mod conn;
pub mod context;
pub mod error;
pub mod middleware;
pub mod planner;
pub mod range;
pub mod resolver;
pub mod router;
pub mod routes;
pub mod transport;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use cs_core::config::Config;

use crate::conn::{idle_watchdog, Activity, IdleTimeoutIo};
use crate::context::AppContext;
use crate::transport::TransportError;

/// Start the camstream server.
///
/// Binds the configured address and serves until SIGINT/SIGTERM.
pub async fn start(config: Config) -> cs_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| cs_core::Error::Config(format!("Invalid server address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| cs_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting server on {addr}");
    tracing::info!("Serving media from {}", config.media.root.display());

    let ctx = AppContext::new(config);
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    serve(listener, ctx, cancel).await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Run the accept loop on an already-bound listener until `cancel` fires.
///
/// Connections already in flight keep running until they finish or idle out.
pub async fn serve(listener: TcpListener, ctx: AppContext, cancel: CancellationToken) {
    let idle_timeout = Duration::from_secs(ctx.config.server.idle_timeout_secs);
    let app = router::build_router(ctx);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let app = app.clone();
                        tokio::spawn(handle_connection(stream, peer, app, idle_timeout));
                    }
                    Err(e) => {
                        tracing::debug!("Accept error: {e}");
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}

/// Serve one TCP connection through hyper/Axum, racing it against the idle
/// watchdog. Whichever finishes first drops the other.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: Router,
    idle_timeout: Duration,
) {
    let activity = Activity::new();
    let io = TokioIo::new(IdleTimeoutIo::new(stream, activity.clone()));
    let hyper_service = TowerToHyperService::new(app.into_service());

    let connection = hyper::server::conn::http1::Builder::new()
        .keep_alive(true)
        .serve_connection(io, hyper_service);

    tokio::select! {
        result = connection => {
            if let Err(e) = result {
                match TransportError::classify(&e) {
                    // Players routinely abort a transfer once they have
                    // what they need.
                    TransportError::Disconnected(kind) => {
                        tracing::debug!(%peer, ?kind, "Client disconnected");
                    }
                    // The body already logged the read failure.
                    TransportError::Body(kind) => {
                        tracing::debug!(%peer, ?kind, "Response body aborted: {e}");
                    }
                    TransportError::Io(kind) => {
                        tracing::warn!(%peer, ?kind, "Connection I/O error: {e}");
                    }
                    TransportError::Protocol => {
                        tracing::debug!(%peer, "Connection ended with error: {e}");
                    }
                }
            }
        }
        _ = idle_watchdog(activity, idle_timeout) => {
            tracing::debug!(%peer, ?idle_timeout, "Closing idle connection");
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
