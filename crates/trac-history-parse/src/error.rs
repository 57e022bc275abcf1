//! Error types for the parsing engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while configuring or feeding the parser.
///
/// Missing markup is never an error; it yields empty results.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Document bytes are not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Configuration can never match anything.
    #[error("invalid parser config: {0}")]
    InvalidConfig(String),

    /// Configuration file not found.
    #[error("config file not found at '{0}'")]
    ConfigNotFound(PathBuf),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
