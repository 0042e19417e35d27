//! The storage seam the agent is written against.

use async_trait::async_trait;

use crate::{Error, Response};

/// Key-value persistence grouped into named buckets.
///
/// Single-entry reads and writes are atomic; writing an existing URL replaces
/// the entry wholesale, so a bucket never holds two entries for one URL.
/// Writes to a bucket that does not exist yet create it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the bucket if it does not exist.
    async fn open(&self, bucket: &str) -> Result<(), Error>;

    async fn has(&self, bucket: &str) -> Result<bool, Error>;

    /// Bucket names in creation order.
    async fn bucket_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a bucket and all of its entries. Returns false if it was absent.
    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error>;

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>, Error>;

    /// First match for `url` across all buckets, in creation order.
    async fn lookup(&self, url: &str) -> Result<Option<Response>, Error>;

    async fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<(), Error>;

    /// Store all entries atomically: either every entry lands or none does.
    async fn put_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error>;

    /// Make `entries` the bucket's whole content in one atomic step.
    ///
    /// Existing entries are dropped; the bucket keeps its creation position.
    async fn replace_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error>;

    /// URLs stored in the bucket, sorted.
    async fn keys(&self, bucket: &str) -> Result<Vec<String>, Error>;

    async fn entry_count(&self, bucket: &str) -> Result<usize, Error> {
        Ok(self.keys(bucket).await?.len())
    }
}
