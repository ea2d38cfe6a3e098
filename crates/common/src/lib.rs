//! Defcred Common - Shared types and traits
//!
//! This crate provides the data model used across the defcred workspace:
//! catalog entries, scan targets, run configuration, the fingerprint
//! request/response pair and the login-attempt descriptors a probe produces.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{DefcredError, DefcredResult};
pub use traits::Fetcher;
pub use types::{
    Auth, AuthType, Catalog, CatalogEntry, Credential, FetchRequest, Fingerprint,
    FingerprintResponse, LoginAttempt, MissingTokenPolicy, RunConfig, ScanTarget, Submission,
    SuccessCriteria, HTTP_PROTOCOL,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
