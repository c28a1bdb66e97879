//! Common error types for photokw

use thiserror::Error;

/// Common result type for photokw operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across photokw crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keyword string that cannot be turned into a keyword path
    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    /// Keyword export file problem (missing section, unreadable content)
    #[error("Keyword file error: {0}")]
    KeywordFile(String),

    /// Glob pattern that failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
}
