//! Short-lived on-disk clip cache
//!
//! Stores audio clips as flat `<key>.mp3` files. Presence on disk is the
//! index: there is no sidecar metadata. Every stored entry carries its own
//! eviction timer, so disk usage stays bounded without a size policy.

mod cache;
mod error;
mod key;
mod types;

pub use cache::{ClipCache, ENTRY_EXTENSION};
pub use error::{CacheError, Result};
pub use key::{CacheKey, MAX_KEY_LEN};
pub use types::{CacheEntry, CacheStats, EntryRef};
