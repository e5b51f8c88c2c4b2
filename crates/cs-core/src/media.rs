//! Media-domain types: validated identifiers, resolved locations, and byte
//! ranges.
//!
//! Raw request strings never reach filesystem or header code directly; they
//! are first turned into one of these types by a validating constructor.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// MediaIdentifier
// ---------------------------------------------------------------------------

/// Reason an identifier was rejected before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier contains a NUL byte")]
    NulByte,
    #[error("identifier contains a path separator or drive prefix")]
    Separator,
    #[error("identifier starts with a dot")]
    Dotted,
    #[error("extension {0:?} is not allowed")]
    Extension(String),
}

/// A single file name that is safe to join onto the media root.
///
/// Only plain names are accepted: no separators, no `..`, no hidden files,
/// and the extension must be on the configured allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MediaIdentifier(String);

impl MediaIdentifier {
    /// Validate `raw` against the naming rules and the extension allow-list.
    ///
    /// Extension comparison is ASCII case-insensitive.
    pub fn parse(raw: &str, extensions: &[String]) -> Result<Self, IdentifierError> {
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if raw.contains('\0') {
            return Err(IdentifierError::NulByte);
        }
        if raw.contains(['/', '\\', ':']) {
            return Err(IdentifierError::Separator);
        }
        // Covers ".", ".." and hidden files in one check.
        if raw.starts_with('.') {
            return Err(IdentifierError::Dotted);
        }

        let ext = extension_of(raw);
        if !extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)) {
            return Err(IdentifierError::Extension(ext.to_owned()));
        }

        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased file extension, without the dot.
    pub fn extension(&self) -> String {
        extension_of(&self.0).to_ascii_lowercase()
    }

    /// MIME type served for this identifier's resource class.
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.extension())
    }
}

impl fmt::Display for MediaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// Map a lowercase container extension to its MIME type.
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "ts" => "video/mp2t",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// MediaLocation
// ---------------------------------------------------------------------------

/// A media file that existed as a regular file at resolution time.
///
/// Built per request by the path resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocation {
    identifier: MediaIdentifier,
    path: PathBuf,
    size: u64,
}

impl MediaLocation {
    pub fn new(identifier: MediaIdentifier, path: PathBuf, size: u64) -> Self {
        Self {
            identifier,
            path,
            size,
        }
    }

    pub fn identifier(&self) -> &MediaIdentifier {
        &self.identifier
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Total size in bytes as reported by the metadata lookup.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> &'static str {
        self.identifier.content_type()
    }
}

// ---------------------------------------------------------------------------
// ByteRange
// ---------------------------------------------------------------------------

/// An inclusive byte interval `[start, end]` of a resource of `total` bytes.
///
/// Always satisfiable: `start <= end < total`, which also means `total > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
    total: u64,
}

impl ByteRange {
    /// Build a range, returning `None` unless `start <= end < total`.
    pub fn new(start: u64, end: u64, total: u64) -> Option<Self> {
        (start <= end && end < total).then_some(Self { start, end, total })
    }

    /// The whole resource. `None` for an empty resource.
    pub fn full(total: u64) -> Option<Self> {
        total.checked_sub(1).and_then(|last| Self::new(0, last, total))
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of bytes in the interval.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether this interval covers the whole resource.
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total
    }

    /// `Content-Range` value for a 206 response.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}/{}", self.start, self.end, self.total)
    }
}
