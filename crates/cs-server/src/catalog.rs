//! Catalog discovery over the fixed candidate list.
//!
//! Recomputed on every call so the answer always matches the filesystem.

use std::sync::Arc;

use cs_core::config::MediaConfig;
use cs_core::MediaIdentifier;

use crate::resolver::PathResolver;

/// Filters the configured candidates down to those that currently resolve.
#[derive(Debug, Clone)]
pub struct CatalogLister {
    candidates: Vec<String>,
    resolver: Arc<PathResolver>,
}

impl CatalogLister {
    pub fn new(config: &MediaConfig, resolver: Arc<PathResolver>) -> Self {
        Self {
            candidates: config.candidates.clone(),
            resolver,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Available identifiers, in candidate order.
    pub async fn list(&self) -> Vec<MediaIdentifier> {
        let mut available = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            if let Ok(location) = self.resolver.resolve(candidate).await {
                available.push(location.identifier().clone());
            }
        }
        available
    }
}
