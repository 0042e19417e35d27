//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned cache buckets with SQLite and in-memory backends
//! - Request/response values used across the agent
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{Bucket, BucketName, BucketRole, CacheDb, CacheStore, MemoryStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, Response};
