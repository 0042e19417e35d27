//! Out-of-band commands from the host page.
//!
//! Wire format, one JSON object per message:
//!
//! ```json
//! {"type": "FORCE_ACTIVATE"}
//! {"type": "CACHE_URLS", "urls": ["/static/js/extra.js", "/admin"]}
//! ```

use std::sync::Arc;

use futures_util::future::join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Bucket, BucketName, CacheStore, Error, Request};
use url::Url;

use crate::fetch::{Fetcher, canonicalize};
use crate::lifecycle::ActivationReport;

/// A control message posted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Skip waiting: activate as soon as the agent is installed.
    ForceActivate,
    /// Fetch each URL and store it in the dynamic bucket, best effort.
    CacheUrls { urls: Vec<String> },
}

/// One URL that could not be cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BulkCacheFailure {
    pub url: String,
    pub error: String,
}

/// Result of a `CACHE_URLS` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BulkCacheReport {
    /// Canonical URLs now stored in the dynamic bucket.
    pub cached: Vec<String>,
    pub failed: Vec<BulkCacheFailure>,
}

/// What a control message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ControlOutcome {
    /// The agent activated (or already was active).
    Activated(ActivationReport),
    /// Activation will happen without further action: after install, or
    /// because it is already under way.
    ActivationDeferred,
    Cached(BulkCacheReport),
}

/// Executes `CACHE_URLS` against the dynamic bucket.
pub struct ControlChannel {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Fetcher>,
    origin: Url,
    bucket: BucketName,
}

impl ControlChannel {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>, origin: Url, bucket: BucketName) -> Self {
        Self { store, network, origin, bucket }
    }

    /// Fetch and store every URL independently.
    ///
    /// A failing URL is logged and reported; it never stops the others.
    ///
    /// # Errors
    ///
    /// Only if the dynamic bucket cannot be opened.
    pub async fn cache_urls(&self, urls: &[String]) -> Result<BulkCacheReport, Error> {
        let bucket = Bucket::open(self.store.clone(), self.bucket.clone()).await?;

        let results = join_all(urls.iter().map(|raw| self.cache_one(&bucket, raw))).await;

        let mut report = BulkCacheReport::default();
        for (raw, result) in urls.iter().zip(results) {
            match result {
                Ok(url) => report.cached.push(url),
                Err(e) => {
                    tracing::warn!(url = %raw, error = %e, "bulk cache failed for url");
                    report.failed.push(BulkCacheFailure { url: raw.clone(), error: e.to_string() });
                }
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "bulk cache finished"
        );

        Ok(report)
    }

    async fn cache_one(&self, bucket: &Bucket, raw: &str) -> Result<String, Error> {
        let url = canonicalize(&self.origin, raw).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let response = self.network.fetch(&Request::get(url.as_str())).await?;
        if !response.is_cacheable() {
            return Err(Error::Network(format!("status {}", response.status)));
        }
        bucket.put(url.as_str(), &response).await?;
        Ok(url.to_string())
    }
}
