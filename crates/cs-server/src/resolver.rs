//! Path resolution: untrusted identifier to a regular file under the media
//! root.
//!
//! Every failure collapses into [`cs_core::Error::NotFound`] so clients
//! cannot tell an invalid name from a missing file. The reason is only
//! logged.

use std::path::{Path, PathBuf};

use cs_core::config::MediaConfig;
use cs_core::{Error, MediaIdentifier, MediaLocation, Result};

/// Resolves identifiers against a fixed root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    extensions: Vec<String>,
}

impl PathResolver {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            extensions: config.extensions.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate the identifier syntactically, without any I/O.
    pub fn identifier(&self, raw: &str) -> Result<MediaIdentifier> {
        MediaIdentifier::parse(raw, &self.extensions).map_err(|reason| {
            tracing::debug!(identifier = %raw.escape_debug(), %reason, "Rejected media identifier");
            not_found(raw)
        })
    }

    /// Resolve `raw` to an existing regular file inside the root.
    ///
    /// Performs a single `lstat`-style lookup. Directories, special files
    /// and symlinks resolve to `NotFound` like missing files do, so the
    /// file served is always a direct child of the root.
    pub async fn resolve(&self, raw: &str) -> Result<MediaLocation> {
        let identifier = self.identifier(raw)?;
        let path = self.root.join(identifier.as_str());

        // Identifiers are single plain components, so the join cannot escape.
        if !path.starts_with(&self.root) {
            tracing::warn!(identifier = %identifier, "Joined path escaped media root");
            return Err(not_found(raw));
        }

        let metadata = match tokio::fs::symlink_metadata(&path).await {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(identifier = %identifier, error = %e, "Media lookup failed");
                return Err(not_found(raw));
            }
        };

        if metadata.file_type().is_symlink() {
            tracing::warn!(identifier = %identifier, "Refusing to follow symlink in media root");
            return Err(not_found(raw));
        }
        if !metadata.is_file() {
            tracing::debug!(identifier = %identifier, "Media path is not a regular file");
            return Err(not_found(raw));
        }

        Ok(MediaLocation::new(identifier, path, metadata.len()))
    }
}

fn not_found(raw: &str) -> Error {
    Error::not_found("media", raw.escape_debug())
}
