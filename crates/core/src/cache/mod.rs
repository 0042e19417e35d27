//! Versioned cache buckets.
//!
//! A bucket maps a canonical request URL to a stored response. Buckets are
//! named `<role>-v<version>`, so a version bump always lands in a fresh
//! bucket instead of mutating the previous one.
//!
//! Two backends implement [`CacheStore`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, WAL mode, versioned migrations
//! - [`MemoryStore`]: in-process maps, for tests and embedders

pub mod bucket;
pub mod connection;
pub mod entries;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use bucket::{Bucket, BucketName, BucketRole};
pub use connection::CacheDb;
pub use memory::MemoryStore;
pub use store::CacheStore;
