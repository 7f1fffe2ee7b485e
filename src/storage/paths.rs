// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the on-disk key-value layout.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Directory name used under `$HOME` when no data directory is configured.
pub const DEFAULT_DATA_DIR_NAME: &str = ".clientdesk";

/// Storage path utilities for the file-backed store.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        let root = std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR_NAME));
        Self { root }
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persisted slots.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the JSON file backing a slot.
    pub fn slot(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Temporary sibling used by one write while a slot is being replaced.
    pub fn slot_tmp(&self, key: &str, write_id: Uuid) -> PathBuf {
        self.root.join(format!("{key}.json.{}.tmp", write_id.simple()))
    }
}

/// Slot keys become file names, so only a conservative character set is allowed.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
