//! reqwest-backed fetcher for fingerprint requests

use std::collections::BTreeMap;
use std::error::Error as _;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use defcred_common::{DefcredError, DefcredResult, FetchRequest, Fetcher, FingerprintResponse};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::{Client, Proxy, Url};
use tracing::{debug, instrument};

/// Issues each request from a fresh client and cookie jar.
///
/// Certificate verification is off: default-credential targets are mostly
/// appliances with self-signed certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestFetcher;

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self
    }

    fn client(&self, request: &FetchRequest, jar: Arc<SessionJar>) -> DefcredResult<Client> {
        let mut builder = Client::builder()
            .timeout(request.timeout)
            .danger_accept_invalid_certs(true)
            .cookie_provider(jar);

        if let Some(proxy) = &request.proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| DefcredError::Config(format!("invalid proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        if let Some(user_agent) = &request.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder
            .build()
            .map_err(|e| DefcredError::Config(format!("failed to build HTTP client: {}", e)))
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> DefcredResult<FingerprintResponse> {
        let jar = Arc::new(SessionJar::default());
        let client = self.client(request, jar.clone())?;

        let mut builder = client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.cookies.is_empty() {
            builder = builder.header(COOKIE, cookie_header(&request.cookies));
        }

        let response = builder.send().await.map_err(classify)?;
        let final_url = response.url().clone();
        debug!("{} -> {} {}", request.url, response.status(), final_url);

        let mut fp = FingerprintResponse::new(response.status().as_u16(), final_url.as_str());
        for (name, value) in response.headers() {
            fp = fp.with_header(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        fp.cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();

        fp.body = response.text().await.map_err(classify)?;

        fp.session_cookies = jar.received();
        fp.session_cookies
            .extend(fp.cookies.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(fp)
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

/// Cookie jar that also remembers every cookie set on any hop of the
/// request, whatever its `Domain` or `Path`.
#[derive(Default)]
struct SessionJar {
    jar: Jar,
    received: Mutex<BTreeMap<String, String>>,
}

impl SessionJar {
    fn received(&self) -> BTreeMap<String, String> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        if let Ok(mut received) = self.received.lock() {
            for header in &headers {
                match header.to_str().ok().and_then(set_cookie_pair) {
                    Some((name, Some(value))) => {
                        received.insert(name, value);
                    }
                    Some((name, None)) => {
                        received.remove(&name);
                    }
                    None => {}
                }
            }
        }
        self.jar.set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

/// Name and value of a `Set-Cookie` header. The value is `None` when the
/// header deletes the cookie (`Max-Age=0`).
fn set_cookie_pair(header: &str) -> Option<(String, Option<String>)> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let deleted = parts.any(|attr| {
        attr.split_once('=').is_some_and(|(k, v)| {
            k.trim().eq_ignore_ascii_case("max-age") && v.trim().starts_with(['0', '-'])
        })
    });
    let value = (!deleted).then(|| value.trim().trim_matches('"').to_string());
    Some((name.to_string(), value))
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

fn classify(e: reqwest::Error) -> DefcredError {
    if e.is_timeout() {
        return DefcredError::Timeout(e.to_string());
    }
    if e.is_builder() {
        return DefcredError::Config(e.to_string());
    }
    if e.is_connect() {
        let mut source = e.source();
        while let Some(inner) = source {
            let msg = inner.to_string().to_lowercase();
            if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
                return DefcredError::Tls(inner.to_string());
            }
            source = inner.source();
        }
    }
    DefcredError::Network(e.to_string())
}
