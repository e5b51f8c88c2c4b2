//! Application context shared by all route handlers via Axum state.
//!
//! Everything here is built once at startup from the immutable [`Config`]
//! and is cheap to clone per request.

use std::sync::Arc;

use cs_core::config::Config;

use crate::catalog::CatalogLister;
use crate::resolver::PathResolver;
use crate::transport::ActiveStreams;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub resolver: Arc<PathResolver>,
    pub catalog: Arc<CatalogLister>,
    /// Sessions currently holding an open media file.
    pub active_streams: ActiveStreams,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let resolver = Arc::new(PathResolver::new(&config.media));
        let catalog = Arc::new(CatalogLister::new(&config.media, resolver.clone()));
        Self {
            config: Arc::new(config),
            resolver,
            catalog,
            active_streams: ActiveStreams::default(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.config.media.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_and_catalog_share_config() {
        let mut config = Config::default();
        config.media.root = "/srv/cctv".into();
        config.media.candidates = vec!["front.mp4".into()];

        let ctx = AppContext::new(config);
        assert_eq!(ctx.resolver.root(), std::path::Path::new("/srv/cctv"));
        assert_eq!(ctx.catalog.candidates(), ["front.mp4"]);
        assert_eq!(ctx.chunk_size(), 64 * 1024);
        assert_eq!(ctx.active_streams.current(), 0);
    }
}
