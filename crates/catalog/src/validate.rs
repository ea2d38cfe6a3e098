//! Catalog entry validation
//!
//! The fingerprinting core assumes well-formed entries, so anything it would
//! trip over is rejected here at load time.

use defcred_common::{AuthType, CatalogEntry, DefcredError, DefcredResult};
use regex::Regex;

pub fn validate_entry(entry: &CatalogEntry) -> DefcredResult<()> {
    let fail = |msg: String| Err(DefcredError::Catalog(format!("{}: {}", entry.name, msg)));

    if entry.name.trim().is_empty() {
        return Err(DefcredError::Catalog("entry without a name".into()));
    }
    if entry.protocol.trim().is_empty() {
        return fail("missing protocol".into());
    }
    if entry.auth.credentials.is_empty() {
        return fail("no credentials".into());
    }
    if !entry.is_http() {
        return Ok(());
    }

    if entry.fingerprint.url.is_empty() {
        return fail("fingerprint has no url".into());
    }
    if entry.auth.url.is_empty() {
        return fail("auth has no url".into());
    }
    for path in entry.fingerprint.url.iter().chain(entry.auth.url.iter()) {
        if !path.starts_with('/') {
            return fail(format!("url path '{path}' must start with '/'"));
        }
    }
    for pattern in &entry.fingerprint.body {
        if let Err(e) = Regex::new(pattern) {
            return fail(format!("bad body pattern '{pattern}': {e}"));
        }
    }
    if entry.auth.kind == AuthType::RawPost {
        if let Some(c) = entry.auth.credentials.iter().find(|c| c.raw.is_none()) {
            return fail(format!("raw_post credential '{}' has no raw body", c.username));
        }
    }
    Ok(())
}
