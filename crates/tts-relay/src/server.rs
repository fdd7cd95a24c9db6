//! HTTP server for the relay
//!
//! Provides /health, /download_tts and serving of stored clips under
//! /tts_cache. Only `<key>.mp3` names are served from the cache directory.

use crate::error::{INVALID_QUERY, MISSING_WORD};
use crate::orchestrator::Orchestrator;
use crate::types::{DownloadQuery, HealthResponse, CLIP_ROUTE};
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use clip_cache::CacheKey;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tracing::{debug, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub orchestrator: Orchestrator,
    /// Target language for every request
    pub lang: String,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(orchestrator: Orchestrator, lang: String) -> Self {
        Self {
            orchestrator,
            lang,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/download_tts", get(download_tts))
        .route(CLIP_ROUTE, get(get_clip))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM
pub async fn start_server(state: SharedState, listener: TcpListener) -> std::io::Result<()> {
    let router = create_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down");
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache = state.orchestrator.cache().stats().await;
    let relay = state.orchestrator.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache,
        relay,
    })
}

/// Resolve `word` to a playable clip reference
async fn download_tts(
    State(state): State<SharedState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            debug!(error = %e, "Rejected query string");
            return (StatusCode::BAD_REQUEST, INVALID_QUERY).into_response();
        }
    };

    let Some(word) = params.word.filter(|w| !w.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, MISSING_WORD).into_response();
    };

    match state.orchestrator.resolve(&word, &state.lang).await {
        Ok(resource) => Json(resource).into_response(),
        Err(e) => {
            warn!(word = %word, error = %e, "Failed to resolve speech clip");
            e.into_response()
        }
    }
}

/// Serve a stored clip. Only entry names are served, so temp files and
/// anything else in the cache directory stay invisible.
async fn get_clip(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    let Some(key) = CacheKey::from_file_name(&name) else {
        debug!(name = %name, "Refused non-entry file name");
        return StatusCode::NOT_FOUND.into_response();
    };

    let path = state.orchestrator.cache().entry_path(&key);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}
