//! CSRF token and session cookie extraction from a fingerprint response

use std::collections::BTreeMap;

use defcred_common::FingerprintResponse;
use scraper::{Html, Selector};
use tracing::{debug, error};

/// Value of the first `<input name="{field}" value="...">` in the body.
///
/// Unparseable markup, a missing input and an empty value are all reported
/// as `None`.
pub fn csrf_token(response: &FingerprintResponse, field: &str) -> Option<String> {
    let token = Selector::parse("input").ok().and_then(|inputs| {
        let document = Html::parse_document(&response.body);
        let value = document
            .select(&inputs)
            .filter(|el| el.value().attr("name") == Some(field))
            .find_map(|el| el.value().attr("value"))
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        value
    });

    match token {
        Some(token) => {
            debug!("Got CSRF token {}: {}", field, token);
            Some(token)
        }
        None => {
            error!("Failed to get CSRF token {} in {}", field, response.final_url);
            None
        }
    }
}

/// The named cookie from the response, as a single-entry map ready to merge
/// into a login attempt's cookies. An empty cookie counts as missing.
pub fn session_cookie(response: &FingerprintResponse, name: &str) -> Option<BTreeMap<String, String>> {
    match response.cookies.get(name).filter(|value| !value.is_empty()) {
        Some(value) => {
            debug!("Got session cookie value: {}", value);
            Some(BTreeMap::from([(name.to_string(), value.clone())]))
        }
        None => {
            error!("Failed to get {} cookie from {}", name, response.final_url);
            None
        }
    }
}
