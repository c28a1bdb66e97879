//! Error types for photokw-tagger
//!
//! Every error here is per-file recoverable: callers log it with the file
//! path and move on to the next file.

use crate::geocode::GeocodeError;
use std::path::PathBuf;
use thiserror::Error;

/// Tagger error type
#[derive(Debug, Error)]
pub enum TaggerError {
    /// Reading or writing tags through the tag store failed
    #[error("Tag store error: {0}")]
    TagStore(String),

    /// GPS tag that cannot be unpacked into decimal degrees
    #[error("Invalid GPS value '{0}'")]
    Gps(String),

    /// Reverse geocoding failed
    #[error("Geocode error: {0}")]
    Geocode(#[from] GeocodeError),

    /// Path given on the command line does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Filesystem watcher could not be set up
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error from the tag store backend
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// photokw-common error
    #[error("Common error: {0}")]
    Common(#[from] photokw_common::Error),
}

/// Result type for tagger operations
pub type TaggerResult<T> = Result<T, TaggerError>;
