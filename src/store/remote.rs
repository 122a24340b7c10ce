use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::Mutex as AsyncMutex;

use super::{
    WatchlistError, WatchlistOwner, WatchlistResult, WatchlistStore, DEFAULT_WATCHLIST_KEY,
};
use crate::models::{MediaId, MediaType, WatchlistEntry};

/// Minimal list-shaped storage the remote watchlist is written against
///
/// Each element is one JSON-encoded [`WatchlistEntry`]. Index 0 is the head
/// of the list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListBackend: Send + Sync {
    /// Reads the whole list; an absent key is an empty list
    async fn range(&self, key: &str) -> WatchlistResult<Vec<String>>;

    /// Inserts one element at the head of the list
    async fn push_front(&self, key: &str, value: String) -> WatchlistResult<()>;

    /// Deletes the list and writes `values` in order, as one atomic step
    async fn replace(&self, key: &str, values: Vec<String>) -> WatchlistResult<()>;

    /// Deletes the list
    async fn delete(&self, key: &str) -> WatchlistResult<()>;
}

/// Watchlist kept in a remote list, most recently added entry first
///
/// Identity is the media `id` alone: a movie and a TV show sharing an id
/// conflict with each other.
///
/// Add and remove are read-modify-write sequences. Mutations for the same
/// storage key are serialized through a per-key async mutex, and the remove
/// rewrite goes through [`ListBackend::replace`] so readers never see the
/// list half-rewritten. Separate processes sharing the backend are not
/// coordinated: two instances can both pass the duplicate check for the same
/// id before either writes.
pub struct RemoteWatchlistStore<B> {
    backend: B,
    base_key: String,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<B: ListBackend> RemoteWatchlistStore<B> {
    /// Creates a store using the default `watchlist` base key
    pub fn new(backend: B) -> Self {
        Self::with_base_key(backend, DEFAULT_WATCHLIST_KEY)
    }

    pub fn with_base_key(backend: B, base_key: impl Into<String>) -> Self {
        Self {
            backend,
            base_key: base_key.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the writer lock for one storage key, creating it on first use
    fn writer_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Reads the list, keeping each raw element next to its decoded entry
    async fn read(&self, key: &str) -> WatchlistResult<Vec<(String, WatchlistEntry)>> {
        let raw = self.backend.range(key).await?;
        raw.into_iter()
            .map(|element| {
                let entry = serde_json::from_str::<WatchlistEntry>(&element)?;
                Ok((element, entry))
            })
            .collect()
    }
}

#[async_trait]
impl<B: ListBackend> WatchlistStore for RemoteWatchlistStore<B> {
    async fn list(&self, owner: &WatchlistOwner) -> WatchlistResult<Vec<WatchlistEntry>> {
        let key = owner.storage_key(&self.base_key);
        let entries = self.read(&key).await?;
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    async fn add(&self, owner: &WatchlistOwner, mut entry: WatchlistEntry) -> WatchlistResult<()> {
        let key = owner.storage_key(&self.base_key);
        let lock = self.writer_lock(&key);
        let _guard = lock.lock().await;

        let current = self.read(&key).await?;
        if current.iter().any(|(_, existing)| existing.id == entry.id) {
            return Err(WatchlistError::Conflict(entry.id));
        }

        entry.added_at.get_or_insert_with(Utc::now);
        let element = serde_json::to_string(&entry)?;
        self.backend.push_front(&key, element).await
    }

    async fn remove(
        &self,
        owner: &WatchlistOwner,
        id: MediaId,
        _media_type: Option<MediaType>,
    ) -> WatchlistResult<()> {
        let key = owner.storage_key(&self.base_key);
        let lock = self.writer_lock(&key);
        let _guard = lock.lock().await;

        let current = self.read(&key).await?;
        let before = current.len();
        let survivors: Vec<String> = current
            .into_iter()
            .filter(|(_, entry)| entry.id != id)
            .map(|(element, _)| element)
            .collect();

        if survivors.len() == before {
            return Ok(());
        }

        self.backend.replace(&key, survivors).await
    }

    async fn clear(&self, owner: &WatchlistOwner) -> WatchlistResult<()> {
        let key = owner.storage_key(&self.base_key);
        let lock = self.writer_lock(&key);
        let _guard = lock.lock().await;

        self.backend.delete(&key).await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
