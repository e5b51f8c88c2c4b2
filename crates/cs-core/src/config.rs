//! Application configuration types.
//!
//! The top-level [`Config`] is deserialized from TOML. Every section defaults
//! sensibly so an empty file is valid. The configuration is built once at
//! startup and shared read-only for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Smallest chunk size that does not trigger a warning.
pub const MIN_RECOMMENDED_CHUNK: usize = 4 * 1024;
/// Largest chunk size that does not trigger a warning.
pub const MAX_RECOMMENDED_CHUNK: usize = 8 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
}

impl Config {
    /// Parse a `Config` from TOML text and reject unusable values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))?;
        config.check()?;
        Ok(config)
    }

    /// Fatal checks: a config failing these cannot run the server.
    pub fn check(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port cannot be 0".into()));
        }
        if self.media.chunk_size == 0 {
            return Err(Error::Config("media.chunk_size cannot be 0".into()));
        }
        if self.media.extensions.is_empty() {
            return Err(Error::Config("media.extensions cannot be empty".into()));
        }
        Ok(())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.media.root.is_dir() {
            warnings.push(format!(
                "media.root {} is not a directory; every lookup will miss",
                self.media.root.display()
            ));
        }

        let chunk = self.media.chunk_size;
        if !(MIN_RECOMMENDED_CHUNK..=MAX_RECOMMENDED_CHUNK).contains(&chunk) {
            warnings.push(format!(
                "media.chunk_size {chunk} is outside the recommended range \
                 {MIN_RECOMMENDED_CHUNK}..={MAX_RECOMMENDED_CHUNK}"
            ));
        }

        for (i, name) in self.media.candidates.iter().enumerate() {
            let allowed = name
                .rsplit_once('.')
                .map(|(_, ext)| {
                    self.media
                        .extensions
                        .iter()
                        .any(|e| e.eq_ignore_ascii_case(ext))
                })
                .unwrap_or(false);
            if !allowed {
                warnings.push(format!(
                    "media.candidates[{i}] {name:?} has no allow-listed extension and will never be listed"
                ));
            }
        }

        if self.server.idle_timeout_secs == 0 {
            warnings.push("server.idle_timeout_secs is 0; idle connections are never reaped".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Close a connection after this many seconds without any bytes moving.
    pub idle_timeout_secs: u64,
    /// Allow cross-origin requests (the browser frontend runs elsewhere).
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            idle_timeout_secs: 30,
            cors: true,
        }
    }
}

/// Media store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory every identifier is resolved against.
    pub root: PathBuf,
    /// Bytes read from disk per transport step.
    pub chunk_size: usize,
    /// Allow-listed file extensions, without the dot.
    pub extensions: Vec<String>,
    /// Fixed identifier list used for catalog discovery.
    pub candidates: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./media"),
            chunk_size: 64 * 1024,
            extensions: ["mp4", "m4v", "mkv", "webm", "mov"]
                .into_iter()
                .map(String::from)
                .collect(),
            candidates: (1..=4).map(|n| format!("cam{n}.mp4")).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

const DEFAULT_PATHS: [&str; 3] = [
    "./camstream.toml",
    "~/.config/camstream/config.toml",
    "/etc/camstream/config.toml",
];

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read config file {}: {e}", path.display()))
    })?;
    Config::from_toml(&content)
}

/// Load config from the given path, else the first default location that
/// exists, else built-in defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());
        if path.exists() {
            tracing::info!("Loading config from {}", path.display());
            return load_config(path);
        }
    }

    tracing::info!("No config file found; using defaults");
    Ok(Config::default())
}
