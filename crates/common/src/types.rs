//! Core data types for defcred
//!
//! Everything here is plain data: catalog entries are read-only once loaded,
//! probes and login attempts are built from them and handed across worker
//! boundaries, so all of it is `Send + Sync` and serde-friendly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DefcredError;

/// Protocol string handled by the HTTP fingerprinting core.
pub const HTTP_PROTOCOL: &str = "http";

fn default_port() -> u16 {
    80
}

/// One known product: how to recognise it and how to log into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub protocol: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub contributor: Option<String>,
    #[serde(default = "default_port")]
    pub default_port: u16,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub fingerprint: Fingerprint,
    pub auth: Auth,
}

impl CatalogEntry {
    #[inline]
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.protocol == HTTP_PROTOCOL
    }
}

/// Request shape and response criteria used to identify a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Headers sent with the fingerprint request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Cookies sent with the fingerprint request.
    #[serde(default)]
    pub cookie: BTreeMap<String, String>,
    /// Probe URL paths, each starting with `/`.
    #[serde(default)]
    pub url: Vec<String>,
    #[serde(default)]
    pub basic_auth_realm: Option<String>,
    #[serde(default)]
    pub server_header: Option<String>,
    /// Body regex patterns. Empty means no body criteria.
    #[serde(default)]
    pub body: Vec<String>,
}

/// How credentials are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    Get,
    Post,
    RawPost,
    BasicAuth,
}

impl AuthType {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuthType::Get => "get",
            AuthType::Post => "post",
            AuthType::RawPost => "raw_post",
            AuthType::BasicAuth => "basic_auth",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    /// Raw request body template, only meaningful for `raw_post`.
    #[serde(default)]
    pub raw: Option<String>,
}

/// Criteria an executor uses to judge a login attempt. Carried, never evaluated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub body: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(rename = "type")]
    pub kind: AuthType,
    /// Auth submission URL paths.
    #[serde(default)]
    pub url: Vec<String>,
    /// Name of the form field holding the anti-forgery token.
    #[serde(default)]
    pub csrf: Option<String>,
    /// Name of the session cookie the login needs.
    #[serde(default)]
    pub sessionid: Option<String>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    /// Form field names for `post`, e.g. `username: j_username`.
    #[serde(default)]
    pub post: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub success: SuccessCriteria,
}

/// Ordered, immutable set of catalog entries.
///
/// Order matters: a probe evaluates entries in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<Arc<CatalogEntry>>,
}

impl Catalog {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CatalogEntry>> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep entries whose name contains `name` and whose category equals
    /// `category` (both case-insensitive, `None` keeps everything).
    #[must_use]
    pub fn filter(&self, name: Option<&str>, category: Option<&str>) -> Self {
        let name = name.map(str::to_lowercase);
        let category = category.map(str::to_lowercase);
        let entries = self
            .entries
            .iter()
            .filter(|e| {
                name.as_deref()
                    .map_or(true, |n| e.name.to_lowercase().contains(n))
            })
            .filter(|e| {
                category.as_deref().map_or(true, |c| {
                    e.category.as_deref().map(str::to_lowercase).as_deref() == Some(c)
                })
            })
            .cloned()
            .collect();
        Self { entries }
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A scan target: a bare address or host, optionally with an observed open port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    pub host: String,
    pub port: Option<u16>,
}

impl ScanTarget {
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

impl FromStr for ScanTarget {
    type Err = DefcredError;

    /// Accepts `1.2.3.4`, `::1`, `host`, `host:8080` and `[::1]:8080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DefcredError::InvalidTarget("empty target".into()));
        }
        if s.parse::<IpAddr>().is_ok() {
            return Ok(Self::new(s));
        }

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| DefcredError::InvalidTarget(s.to_string()))?;
            return match tail.strip_prefix(':') {
                Some(port) => Ok(Self::new(host).with_port(parse_port(s, port)?)),
                None if tail.is_empty() => Ok(Self::new(host)),
                None => Err(DefcredError::InvalidTarget(s.to_string())),
            };
        }

        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => {
                Ok(Self::new(host).with_port(parse_port(s, port)?))
            }
            Some(_) => Err(DefcredError::InvalidTarget(s.to_string())),
            None => Ok(Self::new(s)),
        }
    }
}

fn parse_port(target: &str, port: &str) -> Result<u16, DefcredError> {
    port.parse::<u16>()
        .map_err(|_| DefcredError::InvalidTarget(format!("{target}: bad port '{port}'")))
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.port, self.host.contains(':')) {
            (Some(port), true) => write!(f, "[{}]:{}", self.host, port),
            (Some(port), false) => write!(f, "{}:{}", self.host, port),
            (None, _) => f.write_str(&self.host),
        }
    }
}

/// What a probe does when a matched entry's required token or cookie is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTokenPolicy {
    /// Stop dispatch for the whole probe and return nothing.
    #[default]
    AbortProbe,
    /// Skip only the entry whose token or cookie is missing.
    SkipEntry,
}

/// Per-run settings shared by every probe and login attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub timeout: Duration,
    /// Outbound proxy URL applied to every scheme.
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub missing_token: MissingTokenPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            proxy: None,
            user_agent: None,
            missing_token: MissingTokenPolicy::AbortProbe,
        }
    }
}

impl RunConfig {
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_missing_token(mut self, policy: MissingTokenPolicy) -> Self {
        self.missing_token = policy;
        self
    }
}

/// One outbound fingerprint GET.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

/// The parts of an HTTP response the matcher and extractors look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintResponse {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    /// Lowercased header name to value; repeated headers joined with `", "`.
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Cookies set by the final response.
    pub cookies: BTreeMap<String, String>,
    /// Session jar after the whole request, redirects included.
    pub session_cookies: BTreeMap<String, String>,
}

impl FingerprintResponse {
    #[must_use]
    pub fn new<S: Into<String>>(status: u16, final_url: S) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            ..Default::default()
        }
    }

    /// Builder: add a header, joining repeated names.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
        self
    }

    #[must_use]
    pub fn with_body<S: Into<String>>(mut self, body: S) -> Self {
        self.body = body.into();
        self
    }

    /// Builder: a cookie set by the final response, which also lands in the session jar.
    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self.session_cookies
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Case-insensitive header lookup.
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Submission shape of a login attempt, with its variant-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Submission {
    Get,
    Post { csrf: Option<String> },
    RawPost { csrf: Option<String>, raw: Option<String> },
    BasicAuth,
}

impl Submission {
    #[must_use]
    pub fn kind(&self) -> AuthType {
        match self {
            Submission::Get => AuthType::Get,
            Submission::Post { .. } => AuthType::Post,
            Submission::RawPost { .. } => AuthType::RawPost,
            Submission::BasicAuth => AuthType::BasicAuth,
        }
    }

    #[must_use]
    pub fn csrf(&self) -> Option<&str> {
        match self {
            Submission::Post { csrf } | Submission::RawPost { csrf, .. } => csrf.as_deref(),
            Submission::Get | Submission::BasicAuth => None,
        }
    }
}

/// A fully parameterised, not yet executed credential submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub entry: Arc<CatalogEntry>,
    pub url: String,
    pub username: String,
    pub password: String,
    pub config: Arc<RunConfig>,
    pub cookies: BTreeMap<String, String>,
    pub submission: Submission,
}

impl LoginAttempt {
    #[inline]
    #[must_use]
    pub fn product(&self) -> &str {
        &self.entry.name
    }
}

impl fmt::Display for LoginAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}",
            self.submission.kind(),
            self.url,
            self.username,
            self.password
        )
    }
}
