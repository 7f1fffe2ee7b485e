// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed key-value store.
//!
//! Each slot is one file under the data directory. Values are replaced via
//! write-to-temp + rename, so a crash mid-write leaves the previous value.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use uuid::Uuid;

use super::kv::{KeyValueStore, StorageError, StorageResult};
use super::paths::{is_valid_key, StoragePaths};

/// Key-value store persisting each slot as a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: StoragePaths,
}

impl FileStore {
    /// Create a store rooted at the given paths.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    fn check_key(key: &str) -> StorageResult<()> {
        if is_valid_key(key) {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Self::check_key(key)?;
        match fs::read_to_string(self.paths.slot(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Self::check_key(key)?;
        fs::create_dir_all(self.paths.root())?;

        // Write to a temp file unique to this write, then rename for atomicity
        let temp_path = self.paths.slot_tmp(key, Uuid::new_v4());
        let result = write_file(&temp_path, value)
            .and_then(|()| fs::rename(&temp_path, self.paths.slot(key)));
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result.map_err(StorageError::from)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        Self::check_key(key)?;
        match fs::remove_file(self.paths.slot(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_file(path: &Path, value: &str) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(value.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(store: &FileStore) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(store.paths().root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(StoragePaths::new(temp_dir.path().join("data")));
        (store, temp_dir)
    }

    #[test]
    fn get_on_missing_slot_returns_none() {
        let (store, _temp_dir) = test_store();
        assert!(store.get("user_token").unwrap().is_none());
    }

    #[test]
    fn set_creates_directory_and_persists() {
        let (store, _temp_dir) = test_store();
        store.set("user_token", r#"{"access":"a","refresh":"r"}"#).unwrap();

        assert!(store.paths().slot("user_token").exists());
        assert_eq!(entries(&store), vec!["user_token.json".to_string()]);
        assert_eq!(
            store.get("user_token").unwrap().as_deref(),
            Some(r#"{"access":"a","refresh":"r"}"#)
        );
    }

    #[test]
    fn concurrent_writers_do_not_share_a_temp_file() {
        let (store, _temp_dir) = test_store();
        let values: Vec<String> = (0..8).map(|i| format!(r#"{{"writer":{i}}}"#)).collect();

        std::thread::scope(|scope| {
            for value in &values {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..20 {
                        store.set("user_token", value).unwrap();
                    }
                });
            }
        });

        let last = store.get("user_token").unwrap().unwrap();
        assert!(values.contains(&last));
        assert_eq!(entries(&store), vec!["user_token.json".to_string()]);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let (store, _temp_dir) = test_store();
        store.set("user_token", "first").unwrap();
        store.set("user_token", "second").unwrap();
        assert_eq!(store.get("user_token").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn remove_is_idempotent() {
        let (store, _temp_dir) = test_store();
        store.set("user_token", "value").unwrap();
        store.remove("user_token").unwrap();
        store.remove("user_token").unwrap();
        assert!(store.get("user_token").unwrap().is_none());
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let (store, _temp_dir) = test_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn values_survive_a_new_store_instance() {
        let (store, _temp_dir) = test_store();
        store.set("user_token", "persisted").unwrap();

        let reopened = FileStore::new(store.paths().clone());
        assert_eq!(reopened.get("user_token").unwrap().as_deref(), Some("persisted"));
    }
}
