use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Relay configuration, built once at startup and passed down
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    /// `CACHE_DIR`. Give the relay a directory of its own: startup deletes
    /// every `<key>.mp3` and `.<key>.<n>.part` file in it, each logged at warn.
    /// Other files are left alone.
    pub cache_dir: PathBuf,
    pub lang: String,
    pub tts_base_url: String,
    pub eviction_delay: Duration,
    pub upstream_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cache_dir: PathBuf::from("./tts_cache"),
            lang: "de".to_string(),
            tts_base_url: tts_provider::DEFAULT_BASE_URL.to_string(),
            eviction_delay: Duration::from_secs(20),
            upstream_timeout: Duration::from_secs(30),
        }
    }
}

impl RelayConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration from any variable source. Unset or unparseable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let cache_dir = lookup("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let lang = lookup("TTS_LANG")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or(defaults.lang);

        let tts_base_url = lookup("TTS_BASE_URL").unwrap_or(defaults.tts_base_url);

        let eviction_delay = lookup("EVICTION_DELAY_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.eviction_delay);

        let upstream_timeout = lookup("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);

        Self {
            port,
            cache_dir,
            lang,
            tts_base_url,
            eviction_delay,
            upstream_timeout,
        }
    }
}
