//! Core types for the TTS relay

use clip_cache::{CacheKey, CacheStats, ENTRY_EXTENSION};
use serde::{Deserialize, Serialize};

/// Prefix of every clip URL
pub const CACHE_ROUTE: &str = "/tts_cache";

/// Route serving one stored clip by file name
pub const CLIP_ROUTE: &str = "/tts_cache/{name}";

/// Caller-facing reference to a stored clip.
///
/// Serializes as the `/download_tts` response body, `{"file": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef {
    pub file: String,
}

impl ResourceRef {
    /// The same key names the file on disk and, percent-encoded, the URL
    pub fn for_key(key: &CacheKey) -> Self {
        Self {
            file: format!(
                "{}/{}.{}",
                CACHE_ROUTE,
                urlencoding::encode(key.as_str()),
                ENTRY_EXTENSION
            ),
        }
    }
}

/// Query parameters for `/download_tts`
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub word: Option<String>,
}

/// Counters kept by the fetch orchestrator
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelayStats {
    pub hits: u64,
    pub misses: u64,
    pub upstream_fetches: u64,
    pub joined_in_flight: u64,
    pub in_flight: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
    pub relay: RelayStats,
}
