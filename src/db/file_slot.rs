use std::{
    fmt::Write,
    fs, io,
    path::{Path, PathBuf},
};

use crate::store::{KeyValueSlot, WatchlistError, WatchlistResult};

/// Key-value slot persisted as one JSON file per key under a directory
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for a key; bytes outside `[A-Za-z0-9_-]` are percent-encoded
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                file_name.push(byte as char);
            } else {
                let _ = write!(file_name, "%{:02X}", byte);
            }
        }
        self.dir.join(format!("{}.json", file_name))
    }
}

fn storage_error(context: &str, err: io::Error) -> WatchlistError {
    WatchlistError::Storage(format!("{}: {}", context, err))
}

impl KeyValueSlot for FileSlot {
    fn get_item(&self, key: &str) -> WatchlistResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("Failed to read slot", e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> WatchlistResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_error("Failed to create slot dir", e))?;

        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| storage_error("Failed to write slot", e))?;
        fs::rename(&tmp, &target).map_err(|e| storage_error("Failed to commit slot", e))
    }

    fn remove_item(&self, key: &str) -> WatchlistResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("Failed to remove slot", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_slot() -> FileSlot {
        FileSlot::new(std::env::temp_dir().join(format!("cineverse-slot-{}", Uuid::new_v4())))
    }

    #[test]
    fn test_missing_key_reads_none() {
        let slot = temp_slot();
        assert_eq!(slot.get_item("watchlist").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let slot = temp_slot();

        slot.set_item("watchlist", r#"[{"type":"movie","id":550}]"#).unwrap();
        assert_eq!(
            slot.get_item("watchlist").unwrap().as_deref(),
            Some(r#"[{"type":"movie","id":550}]"#)
        );

        slot.remove_item("watchlist").unwrap();
        assert_eq!(slot.get_item("watchlist").unwrap(), None);
        slot.remove_item("watchlist").unwrap();

        let _ = fs::remove_dir_all(slot.dir());
    }

    #[test]
    fn test_keys_are_encoded_into_file_names() {
        let slot = FileSlot::new("/tmp/slots");
        assert_eq!(
            slot.path_for("watchlist:alice/../x"),
            PathBuf::from("/tmp/slots/watchlist%3Aalice%2F%2E%2E%2Fx.json")
        );
        assert_eq!(slot.path_for("watchlist"), PathBuf::from("/tmp/slots/watchlist.json"));
    }

    #[test]
    fn test_distinct_keys_use_distinct_files() {
        let slot = temp_slot();

        slot.set_item("watchlist:alice", "[1]").unwrap();
        slot.set_item("watchlist_alice", "[2]").unwrap();

        assert_ne!(slot.path_for("watchlist:alice"), slot.path_for("watchlist_alice"));
        assert_eq!(slot.get_item("watchlist:alice").unwrap().as_deref(), Some("[1]"));
        assert_eq!(slot.get_item("watchlist_alice").unwrap().as_deref(), Some("[2]"));

        let _ = fs::remove_dir_all(slot.dir());
    }
}
