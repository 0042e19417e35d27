//! Cache-related MCP tools.
//!
//! Read-only views over the bucket store the agent writes to.

pub mod buckets;
pub mod get;

pub use buckets::buckets_impl;
pub use get::{CacheGetParams, get_impl};
