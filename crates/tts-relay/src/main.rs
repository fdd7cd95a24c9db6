//! TTS relay - spoken-word clips from a short-lived disk cache
//!
//! Fetches synthesized speech for a word from a text-to-speech provider,
//! keeps it on disk for a short window and hands back a URL to play it.

mod config;
mod error;
mod listener;
mod orchestrator;
mod server;
mod types;

#[cfg(test)]
mod test_support;

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::orchestrator::Orchestrator;
use crate::server::{start_server, ServerState, SharedState};
use clip_cache::ClipCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use tts_provider::TtsClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("tts_relay=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting TTS relay...");

    let config = RelayConfig::from_env();
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Language: {}", config.lang);
    info!("TTS provider: {}", config.tts_base_url);
    info!("Eviction delay: {} seconds", config.eviction_delay.as_secs());

    let cache = ClipCache::new(config.cache_dir.clone());
    cache.init().await?;

    let client = TtsClient::with_base_url(&config.tts_base_url, config.upstream_timeout)?;
    let orchestrator = Orchestrator::new(cache, client, config.eviction_delay);

    let state: SharedState = Arc::new(ServerState::new(orchestrator, config.lang.clone()));

    let listener = listener::open_listener(config.port)
        .await
        .map_err(|e| RelayError::Config(format!("Failed to open listener: {}", e)))?;

    start_server(state, listener)
        .await
        .map_err(|e| RelayError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
