use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

use crate::store::{KeyValueSlot, ListBackend, WatchlistError, WatchlistResult};

/// In-process stand-in for the Redis list backend
///
/// Used for local development (`WATCHLIST_BACKEND=memory`) and tests.
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryListBackend {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
}

impl MemoryListBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lists(&self) -> WatchlistResult<MutexGuard<'_, HashMap<String, VecDeque<String>>>> {
        self.lists
            .lock()
            .map_err(|_| WatchlistError::Storage("memory list lock poisoned".to_string()))
    }
}

#[async_trait]
impl ListBackend for MemoryListBackend {
    async fn range(&self, key: &str) -> WatchlistResult<Vec<String>> {
        let lists = self.lists()?;
        Ok(lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn push_front(&self, key: &str, value: String) -> WatchlistResult<()> {
        self.lists()?.entry(key.to_string()).or_default().push_front(value);
        Ok(())
    }

    async fn replace(&self, key: &str, values: Vec<String>) -> WatchlistResult<()> {
        let mut lists = self.lists()?;
        if values.is_empty() {
            lists.remove(key);
        } else {
            lists.insert(key.to_string(), values.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> WatchlistResult<()> {
        self.lists()?.remove(key);
        Ok(())
    }
}

/// In-process key-value slot
#[derive(Default)]
pub struct MemorySlot {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueSlot for MemorySlot {
    fn get_item(&self, key: &str) -> WatchlistResult<Option<String>> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> WatchlistResult<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> WatchlistResult<()> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
        Ok(())
    }
}
