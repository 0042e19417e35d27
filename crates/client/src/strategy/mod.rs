//! Response resolution strategies.
//!
//! - [`CacheFirst`]: static bucket, then any bucket, then network; a network
//!   failure gets one more cache lookup before it is surfaced.
//! - [`NetworkFirst`]: network, then any bucket, then the offline page for
//!   documents, then a synthetic 503. Never fails.

pub mod cache_first;
pub mod network_first;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Response;

use crate::route::Route;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The reserved offline document.
    Offline,
    /// Generated locally; nothing was available.
    Synthetic,
}

/// A response together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub route: Route,
    pub source: ResponseSource,
    pub response: Response,
}

impl Served {
    pub fn new(route: Route, source: ResponseSource, response: Response) -> Self {
        Self { route, source, response }
    }

    pub fn synthetic(route: Route) -> Self {
        Self::new(route, ResponseSource::Synthetic, Response::service_unavailable())
    }
}
