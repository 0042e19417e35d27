//! Cache-first resolution for static assets.

use std::sync::Arc;

use swcache_core::{Bucket, BucketName, CacheStore, Error, Request};

use super::{ResponseSource, Served};
use crate::fetch::Fetcher;
use crate::route::Route;

pub struct CacheFirst {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Fetcher>,
    bucket: BucketName,
}

impl CacheFirst {
    /// `bucket` is the current version's static bucket.
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>, bucket: BucketName) -> Self {
        Self { store, network, bucket }
    }

    /// Resolve `request`, whose URL must already be canonical.
    ///
    /// # Errors
    ///
    /// Cache errors propagate. A network error propagates only when the
    /// second cache lookup also misses.
    pub async fn resolve(&self, request: &Request) -> Result<Served, Error> {
        let key = request.url.as_str();
        let bucket = Bucket::open(self.store.clone(), self.bucket.clone()).await?;

        if let Some(hit) = bucket.get(key).await? {
            tracing::debug!(url = key, bucket = %self.bucket, "cache hit");
            return Ok(Served::new(Route::Static, ResponseSource::Cache, hit));
        }

        if let Some(hit) = self.store.lookup(key).await? {
            tracing::debug!(url = key, "cache hit in another bucket");
            return Ok(Served::new(Route::Static, ResponseSource::Cache, hit));
        }

        tracing::debug!(url = key, "cache miss");

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable()
                    && let Err(e) = bucket.put(key, &response).await
                {
                    tracing::warn!(url = key, error = %e, "failed to store static asset");
                }
                Ok(Served::new(Route::Static, ResponseSource::Network, response))
            }
            Err(err) => match self.store.lookup(key).await? {
                Some(hit) => {
                    tracing::debug!(url = key, "cache populated concurrently, serving it");
                    Ok(Served::new(Route::Static, ResponseSource::Cache, hit))
                }
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeNetwork;
    use swcache_core::{BucketRole, MemoryStore, Response};

    const CSS: &str = "http://app.test/static/a.css";

    fn setup() -> (Arc<MemoryStore>, Arc<FakeNetwork>, CacheFirst) {
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(FakeNetwork::new());
        let strategy =
            CacheFirst::new(store.clone(), network.clone(), BucketName::new(BucketRole::Static, "1"));
        (store, network, strategy)
    }

    #[tokio::test]
    async fn test_hit_makes_no_network_call() {
        let (store, network, strategy) = setup();
        store.put("static-v1", CSS, &Response::new(200, "cached")).await.unwrap();
        network.serve("/static/a.css", Response::new(200, "fresh"));

        let served = strategy.resolve(&Request::get(CSS)).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, bytes::Bytes::from("cached"));
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_hit_in_other_bucket() {
        let (store, network, strategy) = setup();
        store.put("dynamic-v1", CSS, &Response::new(200, "elsewhere")).await.unwrap();

        let served = strategy.resolve(&Request::get(CSS)).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let (store, network, strategy) = setup();
        network.serve("/static/a.css", Response::new(200, "fresh"));

        let served = strategy.resolve(&Request::get(CSS)).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(network.calls(), 1);
        assert!(store.get("static-v1", CSS).await.unwrap().is_some());

        let again = strategy.resolve(&Request::get(CSS)).await.unwrap();
        assert_eq!(again.source, ResponseSource::Cache);
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_returned_but_not_stored() {
        let (store, network, strategy) = setup();
        network.serve("/static/a.css", Response::new(404, "nope"));

        let served = strategy.resolve(&Request::get(CSS)).await.unwrap();
        assert_eq!(served.response.status, 404);
        assert!(store.get("static-v1", CSS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_without_cache_surfaces() {
        let (_store, network, strategy) = setup();
        network.set_offline(true);

        let result = strategy.resolve(&Request::get(CSS)).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    /// Stores the asset into the dynamic bucket while the request is in
    /// flight, then drops the connection.
    struct RacingWriter {
        store: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl Fetcher for RacingWriter {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            self.store.put("dynamic-v1", &request.url, &Response::new(200, "raced")).await?;
            Err(Error::Network("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_network_failure_rechecks_cache() {
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(RacingWriter { store: store.clone() });
        let strategy = CacheFirst::new(store.clone(), network, BucketName::new(BucketRole::Static, "1"));

        let served = strategy.resolve(&Request::get(CSS)).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, bytes::Bytes::from("raced"));
        assert!(store.get("static-v1", CSS).await.unwrap().is_none());
    }
}
