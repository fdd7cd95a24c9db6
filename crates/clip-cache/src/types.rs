//! Cache types

use crate::key::CacheKey;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Metadata for a stored clip. Immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub path: PathBuf,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Reference to a stored clip, returned by `put`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub pending_evictions: usize,
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.pending_evictions, 0);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_cache_entry_serialization() {
        let entry = CacheEntry {
            key: CacheKey::parse("Haus").unwrap(),
            path: PathBuf::from("/tts_cache/Haus.mp3"),
            size: 4821,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "Haus");
        assert_eq!(json["path"], "/tts_cache/Haus.mp3");
        assert_eq!(json["size"], 4821);
        assert!(json["created_at"].is_string());
    }
}
