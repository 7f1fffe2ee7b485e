// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! Persistence for client-side session state, behind the [`KeyValueStore`]
//! trait so the backend can be swapped (file, memory, OS keychain).
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.clientdesk/
//!   user_token.json   # {"access": "...", "refresh": "..."}
//! ```
//!
//! Slots are replaced atomically (temp file + rename). Nothing in this module
//! interprets slot contents; the token store owns the payload format.

pub mod file_store;
pub mod kv;
pub mod paths;

pub use file_store::FileStore;
pub use kv::{KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use paths::StoragePaths;
