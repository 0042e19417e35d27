//! Scripted network and store for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use swcache_core::{CacheStore, Error, MemoryStore, Request, Response};
use tokio::sync::Notify;

use crate::fetch::Fetcher;

/// Serves canned responses keyed by path (plus query), counting every call.
///
/// Unknown paths answer 404; failing paths and offline mode return
/// `Error::Network`.
#[derive(Default)]
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<Vec<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn serve(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    pub(crate) fn fail(&self, path: &str) {
        self.failing.lock().unwrap().push(path.to_string());
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn calls_for(&self, path: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

fn path_of(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(url) => match url.query() {
            Some(q) => format!("{}?{q}", url.path()),
            None => url.path().to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = path_of(&request.url);
        self.log.lock().unwrap().push(path.clone());

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&path) {
            return Err(Error::Network(format!("{path}: connection refused")));
        }

        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

/// A [`MemoryStore`] whose bucket listing can be paused or broken.
///
/// When gated, `bucket_names` signals `entered` and waits for `release`,
/// which holds activation in the `Activating` state.
#[derive(Default)]
pub(crate) struct ScriptedStore {
    inner: MemoryStore,
    gated: AtomicBool,
    broken_listing: AtomicBool,
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

impl ScriptedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn gate_listing(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub(crate) fn break_listing(&self) {
        self.broken_listing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for ScriptedStore {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        self.inner.open(bucket).await
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        self.inner.has(bucket).await
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        if self.broken_listing.load(Ordering::SeqCst) {
            return Err(Error::CacheUnavailable("bucket listing unavailable".into()));
        }
        if self.gated.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.bucket_names().await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        self.inner.delete_bucket(bucket).await
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>, Error> {
        self.inner.get(bucket, url).await
    }

    async fn lookup(&self, url: &str) -> Result<Option<Response>, Error> {
        self.inner.lookup(url).await
    }

    async fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<(), Error> {
        self.inner.put(bucket, url, response).await
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error> {
        self.inner.put_all(bucket, entries).await
    }

    async fn replace_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error> {
        self.inner.replace_all(bucket, entries).await
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, Error> {
        self.inner.keys(bucket).await
    }
}
