//! Client-resident caching agent for swcache.
//!
//! This crate provides the network seam and the agent that intercepts the
//! application's outbound requests: route classification, cache-first and
//! network-first resolution, the install/activate lifecycle, and the control
//! channel.

pub mod agent;
pub mod control;
pub mod fetch;
pub mod lifecycle;
pub mod route;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use agent::Agent;
pub use control::{BulkCacheFailure, BulkCacheReport, ControlChannel, ControlMessage, ControlOutcome};
pub use fetch::{FetchClient, FetchConfig, Fetcher, UrlError, canonicalize};
pub use lifecycle::{ActivationReport, AssetManifest, InstallReport, LifecycleManager, LifecycleState};
pub use route::{Matcher, Route, RouteClassifier, RoutePattern};
pub use strategy::{CacheFirst, NetworkFirst, ResponseSource, Served};
