//! Error types for the TTS provider client

use std::fmt;

#[derive(Debug)]
pub enum TtsError {
    /// Network-level failure reaching the provider
    Http(Box<reqwest::Error>),
    /// Provider answered with a non-success status
    Status(u16),
    /// Configured base URL is not a valid URL
    Url(url::ParseError),
}

impl fmt::Display for TtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "HTTP error: {}", err),
            Self::Status(status) => write!(f, "TTS provider returned status {}", status),
            Self::Url(err) => write!(f, "Invalid provider URL: {}", err),
        }
    }
}

impl std::error::Error for TtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err.as_ref()),
            Self::Url(err) => Some(err),
            Self::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for TtsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

impl From<url::ParseError> for TtsError {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err)
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
