//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which owns a temporary media root and runs the
//! real accept loop (`cs_server::serve`) on a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cs_core::config::Config;
use cs_server::context::AppContext;
use tokio_util::sync::CancellationToken;

/// A running server over a temporary media directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub addr: SocketAddr,
    pub root: tempfile::TempDir,
    cancel: CancellationToken,
}

impl TestHarness {
    /// Start a server with default settings.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start a server after letting the caller adjust the config. The media
    /// root is always the harness temp dir.
    pub async fn start_with(adjust: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().expect("failed to create media root");
        let mut config = Config::default();
        config.media.root = root.path().to_path_buf();
        adjust(&mut config);

        let ctx = AppContext::new(config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let cancel = CancellationToken::new();
        tokio::spawn(cs_server::serve(listener, ctx.clone(), cancel.clone()));

        Self {
            ctx,
            addr,
            root,
            cancel,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Write a media file into the root and return its contents.
    pub fn write_media(&self, name: &str, len: usize) -> Vec<u8> {
        let data = pattern(len);
        std::fs::write(self.root().join(name), &data).expect("failed to write media");
        data
    }

    pub fn media_path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Poll the active-stream gauge until it reaches `expected`.
    pub async fn wait_for_active_streams(&self, expected: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.ctx.active_streams.current() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.ctx.active_streams.current() == expected
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Deterministic, non-repeating-at-256 byte pattern.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
