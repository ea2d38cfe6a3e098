//! Fingerprint Engine - HTTP product identification and login-attempt dispatch
//!
//! This crate decides whether and how credentials should be tried:
//! - building fingerprint probes from targets and the signature catalog
//! - issuing one GET per probe and matching the response against the catalog
//! - extracting CSRF tokens and session cookies the login needs
//! - producing one [`LoginAttempt`](defcred_common::LoginAttempt) per credential pair and auth URL

mod builder;
mod extract;
mod http;
mod matcher;
mod probe;

pub use builder::{build_probes, dedup_probes};
pub use extract::{csrf_token, session_cookie};
pub use http::ReqwestFetcher;
pub use matcher::is_match;
pub use probe::Probe;
