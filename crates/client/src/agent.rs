//! The caching agent: one object the host drives through four entry points.
//!
//! - [`Agent::on_install`] precaches the manifest (and activates right away
//!   when skip-waiting is set).
//! - [`Agent::on_activate`] prunes stale buckets and starts intercepting.
//! - [`Agent::handle`] classifies a request and serves it.
//! - [`Agent::on_message`] executes control messages.

use std::sync::Arc;

use swcache_core::{AppConfig, CacheStore, Error, Request};
use url::Url;

use crate::control::{ControlChannel, ControlMessage, ControlOutcome};
use crate::fetch::{Fetcher, canonicalize};
use crate::lifecycle::{ActivationReport, AssetManifest, InstallReport, LifecycleManager, LifecycleState};
use crate::route::{Route, RouteClassifier};
use crate::strategy::{CacheFirst, NetworkFirst, ResponseSource, Served};

pub struct Agent {
    origin: Url,
    classifier: RouteClassifier,
    lifecycle: LifecycleManager,
    control: ControlChannel,
    cache_first: CacheFirst,
    network_first: NetworkFirst,
    network: Arc<dyn Fetcher>,
}

impl Agent {
    /// Build an agent for the configured version.
    ///
    /// # Errors
    ///
    /// `Error::InvalidUrl` if the origin, a manifest entry or the offline
    /// page cannot be resolved.
    pub fn new(config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let manifest = AssetManifest::resolve(&origin, &config.precache)?;
        let offline_page = canonicalize(&origin, &config.offline_page)
            .map_err(|e| Error::InvalidUrl(format!("offline_page: {e}")))?;

        let static_bucket = config.static_bucket();
        let dynamic_bucket = config.dynamic_bucket();

        Ok(Self {
            classifier: RouteClassifier::from_config(config),
            lifecycle: LifecycleManager::new(
                store.clone(),
                network.clone(),
                manifest,
                static_bucket.clone(),
                dynamic_bucket.clone(),
                config.skip_waiting,
            ),
            control: ControlChannel::new(store.clone(), network.clone(), origin.clone(), dynamic_bucket.clone()),
            cache_first: CacheFirst::new(store.clone(), network.clone(), static_bucket),
            network_first: NetworkFirst::new(store, network.clone(), dynamic_bucket, offline_page.to_string()),
            network,
            origin,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Install, then activate if skip-waiting is set.
    ///
    /// The result reflects install only. A failed follow-up activation is
    /// logged and leaves the agent `Installed`, ready for `on_activate`.
    ///
    /// # Errors
    ///
    /// `Error::PrecacheFailed` when any manifest asset fails; nothing is kept.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        let report = self.lifecycle.install().await?;
        tracing::info!(bucket = %report.bucket, precached = report.precached, "installed");

        if self.lifecycle.skip_waiting()
            && let Err(e) = self.on_activate().await
        {
            tracing::error!(error = %e, "activation after install failed");
        }

        Ok(report)
    }

    /// Activate the installed version.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` if install has not completed; cache errors if
    /// the bucket list cannot be read.
    pub async fn on_activate(&self) -> Result<ActivationReport, Error> {
        let report = self.lifecycle.activate().await?;
        tracing::info!(deleted = report.deleted.len(), "active");
        Ok(report)
    }

    /// Serve a request.
    ///
    /// Intercepted GET requests always yield a response. Errors come only
    /// from requests passed straight to the network: non-GET methods,
    /// unparsable URLs, and anything arriving while the agent is not active.
    pub async fn handle(&self, request: &Request) -> Result<Served, Error> {
        if !self.lifecycle.is_controlling() {
            return self.passthrough(request).await;
        }

        let url = match canonicalize(&self.origin, &request.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "not interceptable");
                return self.passthrough(request).await;
            }
        };

        let route = self.classifier.classify(&request.method, &url, request.accept.as_deref());
        let canonical = Request { url: url.to_string(), ..request.clone() };

        match route {
            Route::Bypass => self.passthrough(request).await,
            Route::Static => match self.cache_first.resolve(&canonical).await {
                Ok(served) => Ok(served),
                Err(e) => {
                    tracing::warn!(url = %canonical.url, error = %e, "static asset unavailable");
                    Ok(Served::synthetic(route))
                }
            },
            Route::Document | Route::Dynamic => Ok(self.network_first.resolve(&canonical, route).await),
        }
    }

    async fn passthrough(&self, request: &Request) -> Result<Served, Error> {
        let response = self.network.fetch(request).await?;
        Ok(Served::new(Route::Bypass, ResponseSource::Network, response))
    }

    /// Execute a control message.
    ///
    /// `FORCE_ACTIVATE` before install completes is remembered and applied
    /// after install; during activation it has nothing left to do.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` for `FORCE_ACTIVATE` on a retired agent;
    /// activation errors on an installed one; cache errors if the dynamic
    /// bucket cannot be opened for `CACHE_URLS`.
    pub async fn on_message(&self, message: ControlMessage) -> Result<ControlOutcome, Error> {
        match message {
            ControlMessage::ForceActivate => match self.lifecycle.state() {
                LifecycleState::Parsed | LifecycleState::Installing => {
                    self.lifecycle.set_skip_waiting();
                    tracing::info!("activation deferred until install completes");
                    Ok(ControlOutcome::ActivationDeferred)
                }
                LifecycleState::Activating => {
                    tracing::debug!("activation already under way");
                    Ok(ControlOutcome::ActivationDeferred)
                }
                LifecycleState::Redundant => {
                    Err(Error::InvalidState("cannot activate a redundant agent".to_string()))
                }
                LifecycleState::Installed | LifecycleState::Active => {
                    Ok(ControlOutcome::Activated(self.on_activate().await?))
                }
            },
            ControlMessage::CacheUrls { urls } => Ok(ControlOutcome::Cached(self.control.cache_urls(&urls).await?)),
        }
    }

    /// Mark this agent superseded; requests pass straight to the network.
    pub fn retire(&self) {
        self.lifecycle.retire();
    }
}
