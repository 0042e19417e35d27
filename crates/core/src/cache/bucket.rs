//! Bucket naming and typed bucket handles.

use std::fmt;
use std::sync::Arc;

use super::store::CacheStore;
use crate::{Error, Response};

/// Role of a bucket within the agent's namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketRole {
    /// Precached, long-lived assets.
    Static,
    /// Runtime-populated responses.
    Dynamic,
}

impl BucketRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketRole::Static => "static",
            BucketRole::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for BucketRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bucket name in the agent's namespace: `<role>-v<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName {
    role: BucketRole,
    version: String,
}

impl BucketName {
    pub fn new(role: BucketRole, version: impl Into<String>) -> Self {
        Self { role, version: version.into() }
    }

    /// Parse a stored bucket name.
    ///
    /// Returns `None` for names outside the namespace, which callers must
    /// leave untouched.
    pub fn parse(name: &str) -> Option<Self> {
        [BucketRole::Static, BucketRole::Dynamic]
            .into_iter()
            .find_map(|role| {
                name.strip_prefix(role.as_str())
                    .and_then(|rest| rest.strip_prefix("-v"))
                    .filter(|version| !version.is_empty())
                    .map(|version| Self::new(role, version))
            })
    }

    pub fn role(&self) -> BucketRole {
        self.role
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.role, self.version)
    }
}

/// Handle to an opened bucket.
///
/// Obtained through [`Bucket::open`], which creates the bucket lazily.
#[derive(Clone)]
pub struct Bucket {
    store: Arc<dyn CacheStore>,
    key: String,
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket").field("name", &self.key).finish()
    }
}

impl Bucket {
    /// Open (creating if needed) the named bucket.
    pub async fn open(store: Arc<dyn CacheStore>, name: BucketName) -> Result<Self, Error> {
        let key = name.to_string();
        store.open(&key).await?;
        Ok(Self { store, key })
    }

    pub async fn get(&self, url: &str) -> Result<Option<Response>, Error> {
        self.store.get(&self.key, url).await
    }

    pub async fn put(&self, url: &str, response: &Response) -> Result<(), Error> {
        self.store.put(&self.key, url, response).await
    }

    /// Make `entries` the bucket's exact content, atomically.
    pub async fn replace_all(&self, entries: Vec<(String, Response)>) -> Result<(), Error> {
        self.store.replace_all(&self.key, entries).await
    }

    /// Drop every entry, keeping the bucket itself.
    pub async fn clear(&self) -> Result<(), Error> {
        self.replace_all(Vec::new()).await
    }

}
