//! Fetch orchestration: cache lookup, upstream fetch, store, evict

use crate::error::{RelayError, Result, MISSING_WORD};
use crate::types::{RelayStats, ResourceRef};
use clip_cache::{CacheKey, ClipCache, EntryRef};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tts_provider::TtsClient;

type PendingFetch = Shared<BoxFuture<'static, Result<EntryRef>>>;

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    upstream_fetches: AtomicU64,
    joined_in_flight: AtomicU64,
}

/// Resolves words to playable clip references
#[derive(Clone)]
pub struct Orchestrator {
    cache: ClipCache,
    client: TtsClient,
    eviction_delay: Duration,
    /// Fetches currently running, so concurrent misses share one upstream call
    in_flight: Arc<Mutex<HashMap<CacheKey, PendingFetch>>>,
    counters: Arc<Counters>,
}

impl Orchestrator {
    pub fn new(cache: ClipCache, client: TtsClient, eviction_delay: Duration) -> Self {
        Self {
            cache,
            client,
            eviction_delay,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn cache(&self) -> &ClipCache {
        &self.cache
    }

    /// Resolve `raw_text` spoken in `lang` to a clip reference.
    ///
    /// A clip already on disk is returned without contacting the provider.
    /// Otherwise the clip is fetched once, stored, and scheduled for eviction.
    /// Upstream failures are not retried and leave nothing on disk.
    pub async fn resolve(&self, raw_text: &str, lang: &str) -> Result<ResourceRef> {
        if raw_text.trim().is_empty() {
            return Err(RelayError::InvalidInput(MISSING_WORD.to_string()));
        }
        let key = CacheKey::parse(raw_text)?;

        if self.cache.exists(&key).await {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit");
            return Ok(ResourceRef::for_key(&key));
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Cache miss");

        self.pending_fetch(&key, lang).await?;
        Ok(ResourceRef::for_key(&key))
    }

    pub async fn stats(&self) -> RelayStats {
        let in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();

        RelayStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            upstream_fetches: self.counters.upstream_fetches.load(Ordering::Relaxed),
            joined_in_flight: self.counters.joined_in_flight.load(Ordering::Relaxed),
            in_flight,
        }
    }

    /// Join the running fetch for `key`, or start one.
    ///
    /// The fetch runs in its own task, so it completes even when every
    /// waiting request goes away. It leaves the registry once settled.
    fn pending_fetch(&self, key: &CacheKey, lang: &str) -> PendingFetch {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(pending) = in_flight.get(key) {
            self.counters.joined_in_flight.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Joining in-flight fetch");
            return pending.clone();
        }

        let this = self.clone();
        let task_key = key.clone();
        let lang = lang.to_string();
        let handle = tokio::spawn(async move {
            let result = this.fetch_and_store(&task_key, &lang).await;
            this.in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&task_key);
            result
        });

        let pending = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(RelayError::Internal(format!("fetch task failed: {}", e))))
        }
        .boxed()
        .shared();

        in_flight.insert(key.clone(), pending.clone());
        pending
    }

    async fn fetch_and_store(&self, key: &CacheKey, lang: &str) -> Result<EntryRef> {
        self.counters.upstream_fetches.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let audio = self.client.fetch(key.as_str(), lang).await?;
        let content_type = audio.content_type().unwrap_or("unknown").to_string();
        let entry = self.cache.put_stream(key, audio.into_stream()).await?;
        self.cache.schedule_evict(key, self.eviction_delay);

        info!(
            key = %key,
            lang,
            size = entry.size,
            content_type = %content_type,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stored speech clip"
        );

        Ok(entry)
    }
}
