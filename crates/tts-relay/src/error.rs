//! Error types for the TTS relay

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clip_cache::CacheError;
use std::fmt;
use std::sync::Arc;
use tts_provider::TtsError;

/// Body of the 400 answer for a missing or blank `word`
pub const MISSING_WORD: &str = "Missing word";

/// Body of the 400 answer for a query string that cannot be read
pub const INVALID_QUERY: &str = "Invalid query string";

/// Request-path failures. Cloneable so one upstream fetch can report its
/// outcome to every request waiting on it.
#[derive(Debug, Clone)]
pub enum RelayError {
    /// Missing, blank or unusable text
    InvalidInput(String),
    /// TTS provider answered with a non-success status
    Upstream(u16),
    /// TTS provider could not be reached or the body stream broke
    UpstreamTransport(Arc<dyn std::error::Error + Send + Sync>),
    /// Local write failure
    Storage(Arc<std::io::Error>),
    /// A fetch task died without producing a result
    Internal(String),
    Config(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "{}", msg),
            Self::Upstream(status) => write!(f, "TTS provider returned status {}", status),
            Self::UpstreamTransport(err) => write!(f, "TTS provider unreachable: {}", err),
            Self::Storage(err) => write!(f, "Storage error: {}", err),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UpstreamTransport(err) => Some(err.as_ref()),
            Self::Storage(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, self.to_string()).into_response()
    }
}

impl From<TtsError> for RelayError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::Status(status) => Self::Upstream(status),
            TtsError::Http(err) => Self::UpstreamTransport(Arc::new(*err)),
            TtsError::Url(err) => Self::Config(err.to_string()),
        }
    }
}

impl From<CacheError> for RelayError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidKey(msg) => Self::InvalidInput(msg),
            CacheError::Io(err) => Self::Storage(Arc::new(err)),
            CacheError::Stream(err) => Self::UpstreamTransport(Arc::from(err)),
        }
    }
}

impl From<tracing_subscriber::filter::ParseError> for RelayError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn test_upstream_error_display_includes_status() {
        let err = RelayError::Upstream(429);
        assert_eq!(format!("{}", err), "TTS provider returned status 429");
    }

    #[test]
    fn test_config_error_display() {
        let err = RelayError::Config("bad TTS_BASE_URL".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad TTS_BASE_URL");
    }

    #[test]
    fn test_from_tts_status() {
        let err = RelayError::from(TtsError::Status(503));
        assert!(matches!(err, RelayError::Upstream(503)));
    }

    #[test]
    fn test_from_cache_errors() {
        let err = RelayError::from(CacheError::InvalidKey("key is empty".to_string()));
        assert!(matches!(err, RelayError::InvalidInput(_)));

        let err = RelayError::from(CacheError::Io(std::io::Error::other("disk full")));
        assert!(matches!(err, RelayError::Storage(_)));
        assert!(err.to_string().contains("disk full"));

        let err = RelayError::from(CacheError::Stream(Box::new(std::io::Error::other(
            "connection reset",
        ))));
        assert!(matches!(err, RelayError::UpstreamTransport(_)));
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let response = RelayError::InvalidInput(MISSING_WORD.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Missing word");
    }

    #[tokio::test]
    async fn test_upstream_error_is_server_error() {
        let response = RelayError::Upstream(503).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            "TTS provider returned status 503"
        );
    }

    #[tokio::test]
    async fn test_storage_error_is_server_error() {
        let err = RelayError::Storage(Arc::new(std::io::Error::other("read-only filesystem")));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("read-only filesystem"));
    }
}
