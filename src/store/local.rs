use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{
    WatchlistError, WatchlistOwner, WatchlistResult, WatchlistStore, DEFAULT_WATCHLIST_KEY,
};
use crate::models::{LocalEntry, MediaId, MediaType, WatchlistEntry};

/// String-keyed persistent slot, the shape of browser local storage
pub trait KeyValueSlot: Send + Sync {
    fn get_item(&self, key: &str) -> WatchlistResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> WatchlistResult<()>;
    fn remove_item(&self, key: &str) -> WatchlistResult<()>;
}

/// Watchlist kept as one JSON array of `{type, id}` pairs in a local slot
///
/// Identity is the `(mediaType, id)` pair and entries are kept in insertion
/// order, oldest first. Adding an entry that is already present succeeds
/// without writing. Display fields are not stored and have to be fetched
/// from the metadata gateway when rendering.
///
/// Listing never fails: an absent, unreadable or malformed slot is an empty
/// list. Mutations read the slot strictly, so a slot that cannot be read is
/// a [`WatchlistError::Storage`] instead of being overwritten. A malformed
/// payload is still replaced.
///
/// Slot access is blocking; the async [`WatchlistStore`] methods run it on
/// the blocking thread pool.
pub struct LocalWatchlistStore<S> {
    inner: Arc<SlotState<S>>,
}

struct SlotState<S> {
    slot: S,
    base_key: String,
    writer: Mutex<()>,
}

impl<S: KeyValueSlot> SlotState<S> {
    fn read(&self, key: &str) -> WatchlistResult<Vec<LocalEntry>> {
        Ok(self
            .slot
            .get_item(key)?
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default())
    }

    fn entries(&self, key: &str) -> Vec<LocalEntry> {
        self.read(key).unwrap_or_default()
    }

    fn insert(&self, key: &str, candidate: LocalEntry) -> WatchlistResult<bool> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read(key)?;
        if entries.contains(&candidate) {
            return Ok(false);
        }

        entries.push(candidate);
        self.save(key, &entries)?;
        Ok(true)
    }

    fn delete(&self, key: &str, id: MediaId, media_type: Option<MediaType>) -> WatchlistResult<()> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read(key)?;
        let before = entries.len();
        entries.retain(|e| !(e.id == id && media_type.map_or(true, |kind| kind == e.media_type)));

        if entries.len() == before {
            return Ok(());
        }
        self.save(key, &entries)
    }

    fn reset(&self, key: &str) -> WatchlistResult<()> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        self.slot.remove_item(key)
    }

    fn save(&self, key: &str, entries: &[LocalEntry]) -> WatchlistResult<()> {
        let raw = serde_json::to_string(entries)?;
        self.slot.set_item(key, &raw)
    }
}

impl<S: KeyValueSlot + 'static> LocalWatchlistStore<S> {
    pub fn new(slot: S) -> Self {
        Self::with_base_key(slot, DEFAULT_WATCHLIST_KEY)
    }

    pub fn with_base_key(slot: S, base_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SlotState {
                slot,
                base_key: base_key.into(),
                writer: Mutex::new(()),
            }),
        }
    }

    fn key(&self, owner: &WatchlistOwner) -> String {
        owner.storage_key(&self.inner.base_key)
    }

    /// Current `{type, id}` pairs for an owner, oldest first
    pub fn entries(&self, owner: &WatchlistOwner) -> Vec<LocalEntry> {
        self.inner.entries(&self.key(owner))
    }

    /// Appends the pair unless present; returns whether it was inserted
    pub fn insert(
        &self,
        owner: &WatchlistOwner,
        media_type: MediaType,
        id: MediaId,
    ) -> WatchlistResult<bool> {
        self.inner.insert(&self.key(owner), LocalEntry { media_type, id })
    }

    /// Drops every pair with this id, restricted to one media type when given
    pub fn delete(
        &self,
        owner: &WatchlistOwner,
        id: MediaId,
        media_type: Option<MediaType>,
    ) -> WatchlistResult<()> {
        self.inner.delete(&self.key(owner), id, media_type)
    }

    pub fn reset(&self, owner: &WatchlistOwner) -> WatchlistResult<()> {
        self.inner.reset(&self.key(owner))
    }

    async fn blocking<T, F>(&self, owner: &WatchlistOwner, op: F) -> WatchlistResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SlotState<S>, &str) -> WatchlistResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let key = self.key(owner);
        tokio::task::spawn_blocking(move || op(&inner, &key))
            .await
            .map_err(|e| WatchlistError::Storage(format!("Local slot task failed: {}", e)))?
    }
}

#[async_trait]
impl<S: KeyValueSlot + 'static> WatchlistStore for LocalWatchlistStore<S> {
    async fn list(&self, owner: &WatchlistOwner) -> WatchlistResult<Vec<WatchlistEntry>> {
        self.blocking(owner, |state, key| {
            Ok(state.entries(key).into_iter().map(WatchlistEntry::from).collect())
        })
        .await
    }

    async fn add(&self, owner: &WatchlistOwner, entry: WatchlistEntry) -> WatchlistResult<()> {
        let media_type = entry.media_type.ok_or_else(|| {
            WatchlistError::Validation("Missing required field: mediaType".to_string())
        })?;
        let candidate = LocalEntry {
            media_type,
            id: entry.id,
        };
        self.blocking(owner, move |state, key| state.insert(key, candidate).map(|_| ()))
            .await
    }

    async fn remove(
        &self,
        owner: &WatchlistOwner,
        id: MediaId,
        media_type: Option<MediaType>,
    ) -> WatchlistResult<()> {
        self.blocking(owner, move |state, key| state.delete(key, id, media_type))
            .await
    }

    async fn clear(&self, owner: &WatchlistOwner) -> WatchlistResult<()> {
        self.blocking(owner, |state, key| state.reset(key)).await
    }

    async fn contains(
        &self,
        owner: &WatchlistOwner,
        id: MediaId,
        media_type: Option<MediaType>,
    ) -> WatchlistResult<bool> {
        self.blocking(owner, move |state, key| {
            Ok(state
                .entries(key)
                .iter()
                .any(|e| e.id == id && media_type.map_or(true, |kind| kind == e.media_type)))
        })
        .await
    }

    fn caches_display_fields(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySlot;

    /// Slot whose writes always fail, as if the quota were exhausted
    struct FullSlot {
        stored: Option<String>,
    }

    impl KeyValueSlot for FullSlot {
        fn get_item(&self, _key: &str) -> WatchlistResult<Option<String>> {
            Ok(self.stored.clone())
        }

        fn set_item(&self, _key: &str, _value: &str) -> WatchlistResult<()> {
            Err(WatchlistError::Storage("quota exceeded".to_string()))
        }

        fn remove_item(&self, _key: &str) -> WatchlistResult<()> {
            Err(WatchlistError::Storage("quota exceeded".to_string()))
        }
    }

    /// Slot whose reads fail while writes go through
    struct UnreadableSlot {
        stored: Mutex<String>,
    }

    impl KeyValueSlot for UnreadableSlot {
        fn get_item(&self, _key: &str) -> WatchlistResult<Option<String>> {
            Err(WatchlistError::Storage("permission denied".to_string()))
        }

        fn set_item(&self, _key: &str, value: &str) -> WatchlistResult<()> {
            *self.stored.lock().unwrap() = value.to_string();
            Ok(())
        }

        fn remove_item(&self, _key: &str) -> WatchlistResult<()> {
            Ok(())
        }
    }

    const SAVED: &str = r#"[{"type":"movie","id":550},{"type":"tv","id":1399}]"#;

    fn unreadable_store() -> LocalWatchlistStore<UnreadableSlot> {
        LocalWatchlistStore::new(UnreadableSlot {
            stored: Mutex::new(SAVED.to_string()),
        })
    }

    fn store() -> LocalWatchlistStore<MemorySlot> {
        LocalWatchlistStore::new(MemorySlot::new())
    }

    const OWNER: WatchlistOwner = WatchlistOwner::Shared;

    #[test]
    fn test_empty_slot_lists_nothing() {
        assert!(store().entries(&OWNER).is_empty());
    }

    #[test]
    fn test_insert_keeps_insertion_order() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap();
        store.insert(&OWNER, MediaType::Tv, MediaId(1399)).unwrap();

        let ids: Vec<u64> = store.entries(&OWNER).iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![550, 1399]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let store = store();
        assert!(store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap());
        assert!(!store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap());
        assert_eq!(store.entries(&OWNER).len(), 1);
    }

    #[test]
    fn test_same_id_different_type_are_distinct() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(1399)).unwrap();
        store.insert(&OWNER, MediaType::Tv, MediaId(1399)).unwrap();

        assert_eq!(store.entries(&OWNER).len(), 2);
        assert!(tokio_test::block_on(store.contains(&OWNER, MediaId(1399), Some(MediaType::Tv))).unwrap());
    }

    #[test]
    fn test_delete_with_type_keeps_other_kind() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(1399)).unwrap();
        store.insert(&OWNER, MediaType::Tv, MediaId(1399)).unwrap();

        store.delete(&OWNER, MediaId(1399), Some(MediaType::Movie)).unwrap();

        let remaining = store.entries(&OWNER);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].media_type, MediaType::Tv);
    }

    #[test]
    fn test_delete_without_type_removes_every_kind() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(1399)).unwrap();
        store.insert(&OWNER, MediaType::Tv, MediaId(1399)).unwrap();

        store.delete(&OWNER, MediaId(1399), None).unwrap();

        assert!(store.entries(&OWNER).is_empty());
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap();
        store.delete(&OWNER, MediaId(1), None).unwrap();
        assert_eq!(store.entries(&OWNER).len(), 1);
    }

    #[test]
    fn test_malformed_payload_reads_as_empty() {
        let slot = MemorySlot::new();
        slot.set_item("watchlist", "{not json").unwrap();
        let store = LocalWatchlistStore::new(slot);

        assert!(store.entries(&OWNER).is_empty());
        store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap();
        assert_eq!(store.entries(&OWNER).len(), 1);
    }

    #[test]
    fn test_slot_layout_is_type_id_pairs() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap();

        let raw = store.inner.slot.get_item("watchlist").unwrap().unwrap();
        assert_eq!(raw, r#"[{"type":"movie","id":550}]"#);
    }

    #[test]
    fn test_write_failure_is_storage_error() {
        let store = LocalWatchlistStore::new(FullSlot { stored: None });
        let err = store
            .insert(&OWNER, MediaType::Movie, MediaId(550))
            .unwrap_err();
        assert!(matches!(err, WatchlistError::Storage(_)));
    }

    #[test]
    fn test_failing_slot_still_lists() {
        let store = LocalWatchlistStore::new(FullSlot {
            stored: Some(r#"[{"type":"tv","id":"1399"}]"#.to_string()),
        });
        let entries = store.entries(&OWNER);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, MediaId(1399));
    }

    #[tokio::test]
    async fn test_store_trait_add_then_list_is_oldest_first() {
        let store = store();
        let first = WatchlistEntry::new(MediaId(550), Some(MediaType::Movie));
        let second = WatchlistEntry::new(MediaId(603), Some(MediaType::Movie));

        store.add(&OWNER, first).await.unwrap();
        store.add(&OWNER, second.clone()).await.unwrap();
        store.add(&OWNER, second).await.unwrap();

        let ids: Vec<u64> = store.list(&OWNER).await.unwrap().iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![550, 603]);
    }

    #[tokio::test]
    async fn test_store_trait_add_requires_media_type() {
        let store = store();
        let err = store
            .add(&OWNER, WatchlistEntry::new(MediaId(550), None))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchlistError::Validation(_)));
    }

    #[test]
    fn test_store_trait_clear() {
        let store = store();
        store.insert(&OWNER, MediaType::Movie, MediaId(550)).unwrap();

        tokio_test::block_on(store.clear(&OWNER)).unwrap();

        assert!(tokio_test::block_on(store.list(&OWNER)).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_slot_is_not_overwritten_on_insert() {
        let store = unreadable_store();

        let err = store
            .insert(&OWNER, MediaType::Movie, MediaId(603))
            .unwrap_err();

        assert!(matches!(err, WatchlistError::Storage(_)));
        assert_eq!(*store.inner.slot.stored.lock().unwrap(), SAVED);
    }

    #[test]
    fn test_unreadable_slot_is_not_overwritten_on_delete() {
        let store = unreadable_store();

        let err = store.delete(&OWNER, MediaId(550), None).unwrap_err();

        assert!(matches!(err, WatchlistError::Storage(_)));
        assert_eq!(*store.inner.slot.stored.lock().unwrap(), SAVED);
    }

    #[tokio::test]
    async fn test_unreadable_slot_lists_empty() {
        let store = unreadable_store();
        assert!(store.list(&OWNER).await.unwrap().is_empty());
    }
}
