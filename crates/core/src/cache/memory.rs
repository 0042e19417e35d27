//! In-memory [`CacheStore`].

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::store::CacheStore;
use crate::{Error, Response};

/// Buckets kept in process memory, in creation order.
///
/// Same semantics as the SQLite store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<Vec<(String, BTreeMap<String, Response>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, BTreeMap<String, Response>)>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bucket_mut<'a>(
    buckets: &'a mut Vec<(String, BTreeMap<String, Response>)>, name: &str,
) -> &'a mut BTreeMap<String, Response> {
    let idx = match buckets.iter().position(|(n, _)| n == name) {
        Some(idx) => idx,
        None => {
            buckets.push((name.to_string(), BTreeMap::new()));
            buckets.len() - 1
        }
    };
    &mut buckets[idx].1
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        bucket_mut(&mut self.lock(), bucket);
        Ok(())
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        Ok(self.lock().iter().any(|(n, _)| n == bucket))
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.lock().iter().map(|(n, _)| n.clone()).collect())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        let mut buckets = self.lock();
        let before = buckets.len();
        buckets.retain(|(n, _)| n != bucket);
        Ok(buckets.len() != before)
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>, Error> {
        Ok(self
            .lock()
            .iter()
            .find(|(n, _)| n == bucket)
            .and_then(|(_, entries)| entries.get(url).cloned()))
    }

    async fn lookup(&self, url: &str) -> Result<Option<Response>, Error> {
        Ok(self.lock().iter().find_map(|(_, entries)| entries.get(url).cloned()))
    }

    async fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<(), Error> {
        bucket_mut(&mut self.lock(), bucket).insert(url.to_string(), response.clone());
        Ok(())
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error> {
        // One guard for the whole batch, so no reader sees a partial set.
        let mut buckets = self.lock();
        bucket_mut(&mut buckets, bucket).extend(entries);
        Ok(())
    }

    async fn replace_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error> {
        let mut buckets = self.lock();
        let stored = bucket_mut(&mut buckets, bucket);
        stored.clear();
        stored.extend(entries);
        Ok(())
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .lock()
            .iter()
            .find(|(n, _)| n == bucket)
            .map(|(_, entries)| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_prefers_older_bucket() {
        let store = MemoryStore::new();
        store.open("static-v1").await.unwrap();
        store.put("dynamic-v1", "/x", &Response::new(200, "dynamic")).await.unwrap();
        store.put("static-v1", "/x", &Response::new(200, "static")).await.unwrap();

        let hit = store.lookup("/x").await.unwrap().unwrap();
        assert_eq!(hit.body, bytes::Bytes::from("static"));
    }

    #[tokio::test]
    async fn test_delete_bucket() {
        let store = MemoryStore::new();
        store.put("static-v1", "/a.css", &Response::new(200, "")).await.unwrap();
        assert!(store.delete_bucket("static-v1").await.unwrap());
        assert!(!store.has("static-v1").await.unwrap());
        assert!(store.lookup("/a.css").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_all_drops_previous_entries() {
        let store = MemoryStore::new();
        store.put("static-v1", "/extra.js", &Response::new(200, "extra")).await.unwrap();
        store.put("dynamic-v1", "/x", &Response::new(200, "x")).await.unwrap();

        let batch = vec![("/a.css".to_string(), Response::new(200, "a")), ("/b.png".to_string(), Response::new(200, "b"))];
        store.replace_all("static-v1", batch).await.unwrap();
        assert_eq!(store.keys("static-v1").await.unwrap(), vec!["/a.css".to_string(), "/b.png".to_string()]);

        store.replace_all("static-v1", Vec::new()).await.unwrap();
        assert_eq!(store.entry_count("static-v1").await.unwrap(), 0);
        assert_eq!(store.bucket_names().await.unwrap(), vec!["static-v1".to_string(), "dynamic-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_entry_count_default_method() {
        let store = MemoryStore::new();
        store.put("dynamic-v1", "/a", &Response::new(200, "1")).await.unwrap();
        store.put("dynamic-v1", "/a", &Response::new(200, "2")).await.unwrap();
        store.put("dynamic-v1", "/b", &Response::new(200, "3")).await.unwrap();
        assert_eq!(store.entry_count("dynamic-v1").await.unwrap(), 2);
        assert_eq!(store.entry_count("missing").await.unwrap(), 0);
    }
}
