// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key-value persistence interface and the in-memory backend.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Mutex;

/// Error type for key-value storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io(io::Error),
    /// Key contains characters that cannot be used as a slot name
    InvalidKey(String),
    /// Backend lock was poisoned by a panicking writer
    Poisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: {key:?}"),
            StorageError::Poisoned => write!(f, "Storage lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A string-keyed slot store.
///
/// Implementations must make `set` replace the whole value at once: readers
/// either see the previous value or the new one, never a mix.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot. Absent slots are `Ok(None)`.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace a slot's value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a slot. Removing an absent slot is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Process-local store, used for tests and sessions that should not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}
