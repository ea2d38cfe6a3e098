//! Signature matching of a fingerprint response against one catalog entry

use defcred_common::{CatalogEntry, FingerprintResponse};
use regex::Regex;
use tracing::{debug, error, info};

/// Does `response` look like the product described by `entry`?
///
/// Realm and server checks can only set the result. Each body pattern, in
/// order, overwrites it with its own outcome, so when a body list is present
/// the last pattern decides.
pub fn is_match(entry: &CatalogEntry, response: &FingerprintResponse) -> bool {
    if !entry.is_http() {
        return false;
    }

    let fp = &entry.fingerprint;
    let mut matched = false;

    if let Some(realm) = fp.basic_auth_realm.as_deref().filter(|r| !r.is_empty()) {
        if response
            .header("www-authenticate")
            .is_some_and(|h| h.contains(realm))
        {
            info!("{} basic auth matched: {}", entry.name, realm);
            matched = true;
        }
    }

    if let Some(server) = fp.server_header.as_deref().filter(|s| !s.is_empty()) {
        if response.header("server").is_some_and(|h| h.contains(server)) {
            debug!("{} server header matched: {}", entry.name, server);
            matched = true;
        }
    }

    for pattern in &fp.body {
        if body_matches(pattern, &response.body) {
            info!("{} body matched: {}", entry.name, pattern);
            matched = true;
        } else {
            debug!("{} body not matched", entry.name);
            matched = false;
        }
    }

    matched
}

fn body_matches(pattern: &str, body: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(body),
        Err(e) => {
            error!("Invalid body pattern '{}': {}", pattern, e);
            false
        }
    }
}
