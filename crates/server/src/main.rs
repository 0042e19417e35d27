//! swcache server entry point.
//!
//! Boots the caching agent against the SQLite store, runs install, then
//! serves the agent's interface over MCP on stdio. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{Agent, FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb, CacheStore};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = Arc::new(AppConfig::load()?);
    tracing::info!(
        origin = %config.origin,
        version = %config.cache_version,
        db_path = %config.db_path.display(),
        "Starting swcache server on stdio transport"
    );

    let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from_app(&config)?)?);
    let agent = Arc::new(Agent::new(&config, store.clone(), network)?);

    if let Err(e) = agent.on_install().await {
        tracing::error!(error = %e, "install failed; agent stays uninstalled");
    }

    let handler = handler::SwCacheServer::new(agent, store, config);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
