//! Error types for defcred
//!
//! Library crates return `DefcredError`; binaries wrap it in `anyhow` for context.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefcredError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DefcredError {
    /// Connection-level failures are recovered locally by a probe.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            DefcredError::Network(_) | DefcredError::Timeout(_) | DefcredError::Tls(_)
        )
    }
}

/// Result type alias for defcred operations
pub type DefcredResult<T> = Result<T, DefcredError>;
