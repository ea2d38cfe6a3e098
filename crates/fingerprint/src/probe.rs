//! Fingerprint probe: one GET, signature matching, login-attempt dispatch

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;
use std::sync::Arc;

use defcred_common::{
    AuthType, Catalog, CatalogEntry, Credential, FetchRequest, Fetcher, FingerprintResponse,
    LoginAttempt, MissingTokenPolicy, RunConfig, Submission,
};
use defcred_telemetry as telemetry;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use url::Url;

use crate::extract::{csrf_token, session_cookie};
use crate::http::ReqwestFetcher;
use crate::matcher::is_match;

/// One fingerprint request and everything needed to act on its response.
///
/// Equality and hashing cover only the request identity (host, path, port,
/// TLS, headers, cookies); config and catalog are shared context. A probe
/// holds no connection or logger and can be sent to any worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Probe {
    pub target: String,
    pub url: String,
    pub port: u16,
    pub ssl: bool,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub config: Arc<RunConfig>,
    pub catalog: Arc<Catalog>,
}

impl PartialEq for Probe {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.url == other.url
            && self.port == other.port
            && self.ssl == other.ssl
            && self.headers == other.headers
            && self.cookies == other.cookies
    }
}

impl Eq for Probe {}

impl Hash for Probe {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target.hash(state);
        self.url.hash(state);
        self.port.hash(state);
        self.ssl.hash(state);
        self.headers.hash(state);
        self.cookies.hash(state);
    }
}

impl Probe {
    /// Absolute URL of the fingerprint request.
    #[must_use]
    pub fn full_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        if self.target.contains(':') {
            format!("{}://[{}]:{}{}", scheme, self.target, self.port, self.url)
        } else {
            format!("{}://{}:{}{}", scheme, self.target, self.port, self.url)
        }
    }

    #[must_use]
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            url: self.full_url(),
            headers: self.headers.clone(),
            cookies: self.cookies.clone(),
            timeout: self.config.timeout,
            proxy: self.config.proxy.clone(),
            user_agent: self.config.user_agent.clone(),
        }
    }

    /// Fingerprint the target over HTTP and build login attempts for every
    /// matching catalog entry.
    pub async fn execute(&self) -> Vec<LoginAttempt> {
        self.execute_with(&ReqwestFetcher::new()).await
    }

    /// Same as [`Probe::execute`] with a caller-supplied fetcher.
    ///
    /// Request failures never propagate: they are logged and yield no attempts.
    #[instrument(skip(self, fetcher), fields(url = %self.full_url()))]
    pub async fn execute_with<F: Fetcher + ?Sized>(&self, fetcher: &F) -> Vec<LoginAttempt> {
        let request = self.fetch_request();
        telemetry::record_probe();

        let response = match fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(e) if e.is_connection_failure() => {
                telemetry::record_probe_failure();
                debug!("Failed to connect to {}: {}", request.url, e);
                return Vec::new();
            }
            Err(e) => {
                telemetry::record_probe_failure();
                error!("Fingerprint request to {} not sent: {}", request.url, e);
                return Vec::new();
            }
        };

        let attempts = self.dispatch(&response);
        telemetry::record_attempts(attempts.len());
        attempts
    }

    /// Evaluate every catalog entry, in catalog order, against `response`.
    ///
    /// Under [`MissingTokenPolicy::AbortProbe`] a matched entry whose CSRF
    /// token or session cookie cannot be found ends dispatch and the probe
    /// yields nothing at all, including attempts built for earlier entries.
    #[must_use]
    pub fn dispatch(&self, response: &FingerprintResponse) -> Vec<LoginAttempt> {
        let mut attempts = Vec::new();
        for entry in self.catalog.iter() {
            if !is_match(entry, response) {
                continue;
            }
            telemetry::record_match();
            if self.dispatch_entry(entry, response, &mut attempts).is_break() {
                return Vec::new();
            }
        }
        attempts
    }

    fn dispatch_entry(
        &self,
        entry: &Arc<CatalogEntry>,
        response: &FingerprintResponse,
        attempts: &mut Vec<LoginAttempt>,
    ) -> ControlFlow<()> {
        let csrf = match entry.auth.csrf.as_deref().filter(|f| !f.is_empty()) {
            Some(field) => match csrf_token(response, field) {
                Some(token) => Some(token),
                None => {
                    error!("Missing required CSRF token {} for {}", field, entry.name);
                    return self.on_missing_token();
                }
            },
            None => None,
        };

        let mut cookies = response.session_cookies.clone();
        if let Some(name) = entry.auth.sessionid.as_deref().filter(|n| !n.is_empty()) {
            match session_cookie(response, name) {
                Some(session) => cookies.extend(session),
                None => {
                    error!("Missing session cookie {} for {}", name, response.final_url);
                    return self.on_missing_token();
                }
            }
        }

        let base = base_url(&response.final_url)
            .or_else(|| base_url(&self.full_url()))
            .unwrap_or_default();

        for credential in &entry.auth.credentials {
            for path in &entry.auth.url {
                debug!("Building {} {}:{}", entry.name, credential.username, credential.password);
                attempts.push(LoginAttempt {
                    entry: Arc::clone(entry),
                    url: format!("{}{}", base, path),
                    username: credential.username.clone(),
                    password: credential.password.clone(),
                    config: Arc::clone(&self.config),
                    cookies: cookies.clone(),
                    submission: submission(entry.auth.kind, csrf.as_ref(), credential),
                });
            }
        }
        ControlFlow::Continue(())
    }

    fn on_missing_token(&self) -> ControlFlow<()> {
        match self.config.missing_token {
            MissingTokenPolicy::AbortProbe => ControlFlow::Break(()),
            MissingTokenPolicy::SkipEntry => ControlFlow::Continue(()),
        }
    }
}

fn submission(kind: AuthType, csrf: Option<&String>, credential: &Credential) -> Submission {
    match kind {
        AuthType::Get => Submission::Get,
        AuthType::Post => Submission::Post { csrf: csrf.cloned() },
        AuthType::RawPost => Submission::RawPost {
            csrf: csrf.cloned(),
            raw: credential.raw.clone(),
        },
        AuthType::BasicAuth => Submission::BasicAuth,
    }
}

/// `scheme://host[:port]` of `url`.
fn base_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.has_host().then(|| url.origin().ascii_serialization())
}
