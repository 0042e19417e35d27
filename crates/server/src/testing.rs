//! Fixtures shared by the tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use swcache_client::{Agent, Fetcher};
use swcache_core::{AppConfig, CacheStore, Error, MemoryStore, Request, Response};

/// Canned responses keyed by URL path; unknown paths answer 404.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: HashMap<String, Response>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub(crate) fn with(mut self, path: &str, response: Response) -> Self {
        self.routes.insert(path.to_string(), response);
        self
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }
        let path = url::Url::parse(&request.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| request.url.clone());
        Ok(self.routes.get(&path).cloned().unwrap_or_else(|| Response::new(404, "")))
    }
}

pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        origin: "http://app.test".into(),
        cache_version: "1".into(),
        precache: vec!["/static/a.css".into(), "/offline".into()],
        skip_waiting: false,
        ..Default::default()
    }
}

/// A network serving the precache list of [`test_config`].
pub(crate) fn test_network() -> StubNetwork {
    StubNetwork::default()
        .with("/static/a.css", Response::new(200, "a{}").with_header("content-type", "text/css"))
        .with("/offline", Response::new(200, "offline"))
}

pub(crate) fn test_agent(network: Arc<StubNetwork>) -> (Arc<MemoryStore>, Arc<Agent>) {
    let store = Arc::new(MemoryStore::new());
    let agent = Agent::new(&test_config(), store.clone() as Arc<dyn CacheStore>, network).unwrap();
    (store, Arc::new(agent))
}
