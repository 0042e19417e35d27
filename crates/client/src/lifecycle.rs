//! Install/activate lifecycle.
//!
//! ```text
//! Parsed -> Installing -> Installed -> Activating -> Active
//!              |                                       |
//!              +--(precache failed)--> Parsed          +--(retire)--> Redundant
//! ```
//!
//! Install precaches the asset manifest into the static bucket as one batch:
//! every fetch must return 200 before anything is written. Activation deletes
//! every bucket in the `static-v*` / `dynamic-v*` namespace other than the
//! current version's pair, then claims interception.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Bucket, BucketName, CacheStore, Error, Request, Response};
use url::Url;

use crate::fetch::Fetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Constructed, not installed yet (or last install failed).
    Parsed,
    Installing,
    Installed,
    Activating,
    /// Intercepting requests.
    Active,
    /// Superseded; no longer intercepts.
    Redundant,
}

/// The precache set, resolved to canonical URLs, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetManifest {
    urls: Vec<Url>,
}

impl AssetManifest {
    /// Resolve manifest entries against `origin`.
    pub fn resolve(origin: &Url, entries: &[String]) -> Result<Self, Error> {
        let urls = entries
            .iter()
            .map(|entry| {
                crate::fetch::canonicalize(origin, entry).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { urls })
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    /// Static bucket that received the manifest.
    pub bucket: String,
    /// Number of precached entries.
    pub precached: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivationReport {
    /// Stale buckets removed from the namespace.
    pub deleted: Vec<String>,
}

pub struct LifecycleManager {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Fetcher>,
    manifest: AssetManifest,
    static_bucket: BucketName,
    dynamic_bucket: BucketName,
    state: Mutex<LifecycleState>,
    skip_waiting: AtomicBool,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>, manifest: AssetManifest, static_bucket: BucketName,
        dynamic_bucket: BucketName, skip_waiting: bool,
    ) -> Self {
        Self {
            store,
            network,
            manifest,
            static_bucket,
            dynamic_bucket,
            state: Mutex::new(LifecycleState::Parsed),
            skip_waiting: AtomicBool::new(skip_waiting),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether requests are intercepted.
    pub fn is_controlling(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Whether activation should follow install without waiting.
    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Request activation as soon as install completes.
    pub fn set_skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    /// Move to `to` if the current state is one of `from`.
    fn transition(&self, from: &[LifecycleState], to: LifecycleState) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        if !from.contains(&previous) {
            return Err(Error::InvalidState(format!("cannot move from {previous:?} to {to:?}")));
        }
        *state = to;
        tracing::info!(from = ?previous, to = ?to, "lifecycle transition");
        Ok(())
    }

    fn set(&self, to: LifecycleState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(from = ?*state, to = ?to, "lifecycle transition");
        *state = to;
    }

    /// Precache the manifest into the static bucket.
    ///
    /// On success the bucket holds exactly the manifest, whatever it held
    /// before.
    ///
    /// # Errors
    ///
    /// `Error::PrecacheFailed` if any asset fails; the state returns to
    /// `Parsed` and the static bucket is left empty.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.transition(&[LifecycleState::Parsed], LifecycleState::Installing)?;

        match self.precache().await {
            Ok(precached) => {
                self.set(LifecycleState::Installed);
                Ok(InstallReport { bucket: self.static_bucket.to_string(), precached })
            }
            Err(e) => {
                tracing::error!(bucket = %self.static_bucket, error = %e, "install failed");
                self.set(LifecycleState::Parsed);
                Err(e)
            }
        }
    }

    /// Replace the static bucket with the manifest, or leave it empty.
    async fn precache(&self) -> Result<usize, Error> {
        let name = self.static_bucket.to_string();
        let existed = self.store.has(&name).await?;
        let bucket = Bucket::open(self.store.clone(), self.static_bucket.clone()).await?;

        let result = async {
            let entries = try_join_all(self.manifest.urls().iter().map(|url| self.fetch_asset(url))).await?;
            let count = entries.len();
            bucket.replace_all(entries).await?;
            Ok::<usize, Error>(count)
        }
        .await;

        if result.is_err() {
            let discarded = if existed {
                bucket.clear().await
            } else {
                self.store.delete_bucket(&name).await.map(|_| ())
            };
            if let Err(e) = discarded {
                tracing::warn!(bucket = %name, error = %e, "failed to discard bucket after failed install");
            }
        }

        result
    }

    async fn fetch_asset(&self, url: &Url) -> Result<(String, Response), Error> {
        let failed = |reason: String| Error::PrecacheFailed { url: url.to_string(), reason };
        match self.network.fetch(&Request::get(url.as_str())).await {
            Ok(response) if response.is_cacheable() => Ok((url.to_string(), response)),
            Ok(response) => Err(failed(format!("status {}", response.status))),
            Err(e) => Err(failed(e.to_string())),
        }
    }

    /// Evict stale buckets and start intercepting.
    ///
    /// Calling this while already active is a no-op. Individual eviction
    /// failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` before install has completed; cache errors if
    /// the bucket list cannot be read (the state returns to `Installed`).
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        if self.state() == LifecycleState::Active {
            tracing::debug!("already active");
            return Ok(ActivationReport::default());
        }
        self.transition(&[LifecycleState::Installed], LifecycleState::Activating)?;

        let names = match self.store.bucket_names().await {
            Ok(names) => names,
            Err(e) => {
                self.set(LifecycleState::Installed);
                return Err(e);
            }
        };

        let keep = [self.static_bucket.to_string(), self.dynamic_bucket.to_string()];
        let mut report = ActivationReport::default();

        for name in names {
            if BucketName::parse(&name).is_none() || keep.contains(&name) {
                continue;
            }
            match self.store.delete_bucket(&name).await {
                Ok(_) => {
                    tracing::info!(bucket = %name, "deleted stale bucket");
                    report.deleted.push(name);
                }
                Err(e) => tracing::warn!(bucket = %name, error = %e, "failed to delete stale bucket"),
            }
        }

        // Claim: from here on every request is intercepted.
        self.set(LifecycleState::Active);
        Ok(report)
    }

    /// Mark this instance superseded.
    pub fn retire(&self) {
        self.set(LifecycleState::Redundant);
    }
}
