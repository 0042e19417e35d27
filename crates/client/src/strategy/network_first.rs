//! Network-first resolution for documents and dynamic requests.

use std::sync::Arc;

use swcache_core::{BucketName, CacheStore, Request, Response};

use super::{ResponseSource, Served};
use crate::fetch::Fetcher;
use crate::route::Route;

pub struct NetworkFirst {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Fetcher>,
    bucket: BucketName,
    offline_page: String,
}

impl NetworkFirst {
    /// `bucket` is the current version's dynamic bucket; `offline_page` the
    /// canonical URL of the reserved offline document.
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>, bucket: BucketName, offline_page: String,
    ) -> Self {
        Self { store, network, bucket, offline_page }
    }

    /// Resolve `request`, whose URL must already be canonical.
    ///
    /// Always produces a response: fresh 200s from the network, else a cached
    /// entry, else the offline page for documents, else a synthetic 503.
    pub async fn resolve(&self, request: &Request, route: Route) -> Served {
        let key = request.url.as_str();

        match self.network.fetch(request).await {
            Ok(response) if response.is_cacheable() => {
                if let Err(e) = self.store.put(&self.bucket.to_string(), key, &response).await {
                    tracing::warn!(url = key, bucket = %self.bucket, error = %e, "failed to store response");
                }
                return Served::new(route, ResponseSource::Network, response);
            }
            Ok(response) => tracing::debug!(url = key, status = response.status, "non-200 response, falling back"),
            Err(e) => tracing::debug!(url = key, error = %e, "network failed, falling back"),
        }

        if let Some(hit) = self.cached(key).await {
            return Served::new(route, ResponseSource::Cache, hit);
        }

        if route == Route::Document
            && let Some(page) = self.cached(&self.offline_page).await
        {
            tracing::debug!(url = key, "serving offline page");
            return Served::new(route, ResponseSource::Offline, page);
        }

        Served::synthetic(route)
    }

    async fn cached(&self, key: &str) -> Option<Response> {
        match self.store.lookup(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = key, error = %e, "cache lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeNetwork;
    use swcache_core::{BucketRole, MemoryStore};

    const PAGE: &str = "http://app.test/admin/x";
    const OFFLINE: &str = "http://app.test/offline";

    fn setup() -> (Arc<MemoryStore>, Arc<FakeNetwork>, NetworkFirst) {
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(FakeNetwork::new());
        let strategy = NetworkFirst::new(
            store.clone(),
            network.clone(),
            BucketName::new(BucketRole::Dynamic, "1"),
            OFFLINE.to_string(),
        );
        (store, network, strategy)
    }

    #[tokio::test]
    async fn test_fresh_response_is_stored_in_dynamic_bucket() {
        let (store, network, strategy) = setup();
        network.serve("/admin/x", Response::new(200, "live"));

        let served = strategy.resolve(&Request::get(PAGE), Route::Document).await;
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(store.get("dynamic-v1", PAGE).await.unwrap().unwrap().body, bytes::Bytes::from("live"));
    }

    #[tokio::test]
    async fn test_network_failure_serves_cached_entry() {
        let (store, network, strategy) = setup();
        store.put("static-v1", PAGE, &Response::new(200, "stale")).await.unwrap();
        network.set_offline(true);

        let served = strategy.resolve(&Request::get(PAGE), Route::Dynamic).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, bytes::Bytes::from("stale"));
    }

    #[tokio::test]
    async fn test_non_200_falls_back_to_cache() {
        let (store, network, strategy) = setup();
        store.put("dynamic-v1", PAGE, &Response::new(200, "stale")).await.unwrap();
        network.serve("/admin/x", Response::new(500, "boom"));

        let served = strategy.resolve(&Request::get(PAGE), Route::Document).await;
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(store.get("dynamic-v1", PAGE).await.unwrap().unwrap().body, bytes::Bytes::from("stale"));
    }

    #[tokio::test]
    async fn test_document_falls_back_to_offline_page() {
        let (store, network, strategy) = setup();
        store.put("static-v1", OFFLINE, &Response::new(200, "offline")).await.unwrap();
        network.set_offline(true);

        let served = strategy.resolve(&Request::get(PAGE), Route::Document).await;
        assert_eq!(served.source, ResponseSource::Offline);
        assert_eq!(served.response.body, bytes::Bytes::from("offline"));
    }

    #[tokio::test]
    async fn test_dynamic_never_gets_offline_page() {
        let (store, network, strategy) = setup();
        store.put("static-v1", OFFLINE, &Response::new(200, "offline")).await.unwrap();
        network.set_offline(true);

        let served = strategy.resolve(&Request::get("http://app.test/api/eventi"), Route::Dynamic).await;
        assert_eq!(served.source, ResponseSource::Synthetic);
        assert_eq!(served.response.status, 503);
        assert!(served.response.body.is_empty());
    }

    #[tokio::test]
    async fn test_document_without_offline_page_is_503() {
        let (_store, network, strategy) = setup();
        network.set_offline(true);

        let served = strategy.resolve(&Request::get(PAGE), Route::Document).await;
        assert_eq!(served.source, ResponseSource::Synthetic);
        assert_eq!(served.response.status, 503);
    }
}
