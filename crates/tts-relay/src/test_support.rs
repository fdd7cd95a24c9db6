//! Local stand-in for the TTS provider, shared by the `orchestrator` and
//! `server` test modules

use crate::orchestrator::Orchestrator;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clip_cache::ClipCache;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tts_provider::TtsClient;

#[derive(Clone)]
struct ProviderState {
    status: StatusCode,
    body: &'static [u8],
    delay: Duration,
    calls: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
}

pub struct MockProvider {
    pub base_url: String,
    calls: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl MockProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.last_query.lock().unwrap().clone()
    }
}

/// Serve `/translate_tts` answering `status` with `body` after `delay`
pub async fn spawn_provider(status: StatusCode, body: &'static [u8], delay: Duration) -> MockProvider {
    let calls = Arc::new(AtomicUsize::new(0));
    let last_query = Arc::new(Mutex::new(None));

    let state = ProviderState {
        status,
        body,
        delay,
        calls: calls.clone(),
        last_query: last_query.clone(),
    };
    let app = Router::new()
        .route("/translate_tts", get(translate_tts))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockProvider {
        base_url: format!("http://{}/translate_tts", addr),
        calls,
        last_query,
    }
}

async fn translate_tts(
    State(state): State<ProviderState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = Some(params);
    tokio::time::sleep(state.delay).await;

    (
        state.status,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        state.body,
    )
        .into_response()
}

/// Orchestrator over a fresh cache in `cache_dir`, talking to `provider`
pub async fn test_orchestrator(
    cache_dir: &Path,
    provider: &MockProvider,
    eviction_delay: Duration,
) -> Orchestrator {
    let cache = ClipCache::new(cache_dir.to_path_buf());
    cache.init().await.unwrap();
    let client = TtsClient::with_base_url(&provider.base_url, Duration::from_secs(5)).unwrap();
    Orchestrator::new(cache, client, eviction_delay)
}
