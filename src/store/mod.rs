//! Watchlist persistence
//!
//! One interface, two implementations:
//! - [`RemoteWatchlistStore`] keeps each watchlist in a remote list-shaped
//!   store (Redis list), newest entry first.
//! - [`LocalWatchlistStore`] keeps a compact `{type, id}` array in a single
//!   string-keyed slot, oldest entry first.
//!
//! Stores never log. They return typed errors and leave presentation to the
//! HTTP layer.

use async_trait::async_trait;

use crate::models::{MediaId, MediaType, WatchlistEntry};

pub mod local;
pub mod remote;

pub use local::{KeyValueSlot, LocalWatchlistStore};
pub use remote::{ListBackend, RemoteWatchlistStore};

/// Default storage key of the shared watchlist
pub const DEFAULT_WATCHLIST_KEY: &str = "watchlist";

/// Watchlist store errors
#[derive(thiserror::Error, Debug)]
pub enum WatchlistError {
    #[error("{0}")]
    Validation(String),

    #[error("Media {0} is already in the watchlist")]
    Conflict(MediaId),

    /// Reserved: removal of an absent entry is a successful no-op
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for WatchlistError {
    fn from(err: serde_json::Error) -> Self {
        WatchlistError::Storage(format!("Malformed watchlist payload: {}", err))
    }
}

pub type WatchlistResult<T> = Result<T, WatchlistError>;

/// Identity of the watchlist an operation targets
///
/// `Shared` is the single deployment-wide list addressed by the base key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum WatchlistOwner {
    #[default]
    Shared,
    User(String),
}

impl WatchlistOwner {
    /// Storage key for this owner under the given base key
    pub fn storage_key(&self, base_key: &str) -> String {
        match self {
            WatchlistOwner::Shared => base_key.to_string(),
            WatchlistOwner::User(user) => format!("{}:{}", base_key, user),
        }
    }
}

/// Trait for watchlist stores
///
/// Identity granularity and ordering differ per implementation; see the
/// implementing types.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Returns every entry in store order; an absent list is empty
    async fn list(&self, owner: &WatchlistOwner) -> WatchlistResult<Vec<WatchlistEntry>>;

    /// Stores a new entry
    async fn add(&self, owner: &WatchlistOwner, entry: WatchlistEntry) -> WatchlistResult<()>;

    /// Removes matching entries; succeeds when nothing matched
    async fn remove(
        &self,
        owner: &WatchlistOwner,
        id: MediaId,
        media_type: Option<MediaType>,
    ) -> WatchlistResult<()>;

    /// Deletes the whole list
    async fn clear(&self, owner: &WatchlistOwner) -> WatchlistResult<()>;

    /// Membership check using the same identity rule as `add`
    async fn contains(
        &self,
        owner: &WatchlistOwner,
        id: MediaId,
        media_type: Option<MediaType>,
    ) -> WatchlistResult<bool> {
        let entries = self.list(owner).await?;
        Ok(entries.iter().any(|e| {
            e.id == id && media_type.map_or(true, |kind| e.media_type.map_or(true, |t| t == kind))
        }))
    }

    /// Whether `title`, `posterPath` and `rating` are kept with each entry
    fn caches_display_fields(&self) -> bool {
        true
    }

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}
