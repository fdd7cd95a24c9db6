//! Cache key derivation

use crate::cache::ENTRY_EXTENSION;
use crate::error::{CacheError, Result};
use serde::Serialize;
use std::fmt;

/// Longest key accepted, in bytes. Keeps `<key>.mp3` and the temp file name
/// under common filesystem name limits.
pub const MAX_KEY_LEN: usize = 200;

/// Normalized text used as both the lookup key and the on-disk file stem.
///
/// Derived by stripping leading and trailing whitespace, so `" Haus"` and
/// `"Haus"` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive a key from raw request text
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim();

        if key.is_empty() {
            return Err(CacheError::InvalidKey("key is empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(CacheError::InvalidKey(format!(
                "key is longer than {} bytes",
                MAX_KEY_LEN
            )));
        }
        if key.contains(['/', '\\']) {
            return Err(CacheError::InvalidKey(
                "key contains a path separator".to_string(),
            ));
        }
        if key.chars().any(char::is_control) {
            return Err(CacheError::InvalidKey(
                "key contains a control character".to_string(),
            ));
        }

        Ok(Self(key.to_string()))
    }

    /// Key of the entry stored under `file_name`, if it is an entry name.
    ///
    /// Only `<key>.mp3` where `<key>` is exactly what `parse` would produce
    /// qualifies; temp files and anything else in the directory do not.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name
            .strip_suffix(ENTRY_EXTENSION)?
            .strip_suffix('.')?;
        let key = Self::parse(stem).ok()?;
        (key.as_str() == stem).then_some(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
