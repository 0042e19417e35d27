//! Network access for the agent.
//!
//! ### Fetcher seam
//! - Strategies and the lifecycle only see the [`Fetcher`] trait, so tests
//!   can script the network.
//! - Any HTTP status is a successful fetch; only transport failures are
//!   errors. Strategies decide what a non-200 means.
//!
//! ### FetchClient
//! - Resolves origin-relative paths with [`canonicalize`].
//! - Forwards method and Accept header.
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Keeps a minimal header set on the response.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize};

use swcache_core::{AppConfig, Error, Request, Response};

/// Headers copied from the network response into stored entries.
const KEPT_HEADERS: &[&str] = &["content-type", "cache-control", "etag", "last-modified"];

/// Anything that can turn a request into a response over the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin for origin-relative request paths.
    pub origin: ::url::Url,

    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Derive the fetch settings from the application config.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = ::url::Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
        })
    }
}

/// HTTP client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let url = canonicalize(&self.config.origin, &request.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {e}", request.method)))?;

        let mut builder = self.http.request(method, url.as_str());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url}: {e}"))
            } else {
                Error::Network(format!("{url}: {e}"))
            }
        })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let kept: Vec<(&str, String)> = KEPT_HEADERS
            .iter()
            .filter_map(|name| {
                response
                    .headers()
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| (*name, v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            method = %request.method,
            %url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(kept
            .into_iter()
            .fold(Response::new(status.as_u16(), body), |resp, (name, value)| resp.with_header(name, value)))
    }
}
