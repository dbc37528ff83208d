//! Error types for trawl.
//!
//! Uses `thiserror` for ergonomic error definitions. Only target problems
//! ever leave [`Scanner::scan`](crate::scanner::Scanner::scan); collaborator
//! failures are absorbed by the orchestrator and logged.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::types::TargetError;

/// Errors returned from a scan entry point.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("scanner has been closed")]
    Closed,
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Failures raised inside a collaborator (enrichment, intelligence, detection).
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("not an IP address: {0}")]
    InvalidAddress(String),

    #[error("no data for {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for collaborator calls.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Configuration loading and saving errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by CLI command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("output failed: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
