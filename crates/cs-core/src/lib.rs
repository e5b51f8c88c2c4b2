//! cs-core: shared types, errors, and configuration for camstream.
//!
//! The server crate builds on the validated domain types defined here:
//! [`MediaIdentifier`] for untrusted names, [`MediaLocation`] for resolved
//! files, and [`ByteRange`] for satisfiable byte intervals.

pub mod config;
pub mod error;
pub mod media;

pub use error::{Error, Result};
pub use media::*;
