//! Core traits for defcred components

use crate::error::DefcredResult;
use crate::types::{FetchRequest, FingerprintResponse};
use async_trait::async_trait;

/// Performs the single fingerprint GET of a probe.
///
/// Implementations open a fresh session per call: no cookies or connections
/// are shared between probes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> DefcredResult<FingerprintResponse>;

    /// Fetcher name/identifier
    fn name(&self) -> &str;
}
