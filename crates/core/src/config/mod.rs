//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{BucketName, BucketRole};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin that relative request paths resolve against.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version embedded in bucket names (`static-v<version>`).
    ///
    /// Set via SWCACHE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SWCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via SWCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SWCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Asset manifest: paths that must be in the static bucket after install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Reserved entry served to document requests when offline.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Path prefix under which static assets live.
    #[serde(default = "default_asset_root")]
    pub asset_root: String,

    /// File extensions treated as static assets under `asset_root`.
    #[serde(default = "default_asset_extensions")]
    pub asset_extensions: Vec<String>,

    /// Web app manifest, always classified static.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Document routes. Entries other than `/` also cover their subtree.
    #[serde(default = "default_document_routes")]
    pub document_routes: Vec<String>,

    /// Activate immediately after a successful install.
    ///
    /// Set via SWCACHE_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

fn default_origin() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_cache_version() -> String {
    "1.0.0".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/offline",
        "/static/css/style.css",
        "/static/js/app.js",
        "/static/manifest.json",
        "/static/icons/icon-192.png",
        "/static/icons/icon-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_page() -> String {
    "/offline".into()
}

fn default_asset_root() -> String {
    "/static/".into()
}

fn default_asset_extensions() -> Vec<String> {
    ["css", "js", "png", "jpg", "jpeg", "svg", "woff", "woff2"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_manifest_path() -> String {
    "/static/manifest.json".into()
}

fn default_document_routes() -> Vec<String> {
    vec!["/".into(), "/admin".into()]
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            precache: default_precache(),
            offline_page: default_offline_page(),
            asset_root: default_asset_root(),
            asset_extensions: default_asset_extensions(),
            manifest_path: default_manifest_path(),
            document_routes: default_document_routes(),
            skip_waiting: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the static bucket for the configured version.
    pub fn static_bucket(&self) -> BucketName {
        BucketName::new(BucketRole::Static, &self.cache_version)
    }

    /// Name of the dynamic bucket for the configured version.
    pub fn dynamic_bucket(&self) -> BucketName {
        BucketName::new(BucketRole::Dynamic, &self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
