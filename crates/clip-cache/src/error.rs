//! Error types for the clip cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// The raw text cannot be used as a cache key
    InvalidKey(String),
    /// Local filesystem failure
    Io(std::io::Error),
    /// The source stream failed before all bytes were written
    Stream(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(msg) => write!(f, "Invalid cache key: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Stream(err) => write!(f, "Source stream error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Stream(err) => Some(err.as_ref()),
            Self::InvalidKey(_) => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
