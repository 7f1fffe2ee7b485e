// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted access/refresh token pair.
//!
//! The pair lives in a single storage slot as `{"access": ..., "refresh": ...}`.
//! Both fields are written together; a payload missing either one is
//! malformed and reads as "no session".

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ClientError;
use crate::storage::KeyValueStore;

/// Default storage slot name.
pub const DEFAULT_TOKEN_SLOT: &str = "user_token";

/// Access and refresh token issued by the credential endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens are credentials; keep them out of debug logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Token store over an injectable key-value backend.
///
/// Clones share the same backend and write lock.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    slot: String,
    /// Serializes read-modify-write updates of the slot
    write_lock: Arc<Mutex<()>>,
}

impl TokenStore {
    /// Create a token store using the default slot.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_slot(backend, DEFAULT_TOKEN_SLOT)
    }

    /// Create a token store using a custom slot name.
    pub fn with_slot(backend: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        Self {
            backend,
            slot: slot.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Slot name the pair is stored under.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Persist a pair, replacing any previous one.
    pub fn save(&self, pair: &TokenPair) -> Result<(), ClientError> {
        let payload = serde_json::to_string(pair)
            .map_err(|e| ClientError::Storage(format!("failed to encode token pair: {e}")))?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.set(&self.slot, &payload)?;
        Ok(())
    }

    /// Load the stored pair.
    ///
    /// Missing, unreadable and malformed payloads all read as `None`.
    pub fn load(&self) -> Option<TokenPair> {
        let raw = match self.backend.get(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Failed to read persisted tokens");
                return None;
            }
        };

        match serde_json::from_str::<TokenPair>(&raw) {
            Ok(pair) if !pair.access.is_empty() && !pair.refresh.is_empty() => Some(pair),
            Ok(_) => {
                warn!(slot = %self.slot, "Persisted token pair has an empty field; ignoring");
                None
            }
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Persisted token pair is malformed; ignoring");
                None
            }
        }
    }

    /// Current access token.
    pub fn access(&self) -> Option<String> {
        self.load().map(|pair| pair.access)
    }

    /// Current refresh token.
    pub fn refresh(&self) -> Option<String> {
        self.load().map(|pair| pair.refresh)
    }

    /// Remove all persisted token state. Clearing an empty store is a no-op.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.backend.remove(&self.slot) {
            warn!(slot = %self.slot, error = %e, "Failed to clear persisted tokens");
        }
    }

    /// Replace the access token, keeping the refresh token.
    ///
    /// Does nothing when no pair is stored.
    pub fn update_access_only(&self, access: &str) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(mut pair) = self.load() else {
            return;
        };
        pair.access = access.to_string();

        let payload = match serde_json::to_string(&pair) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Failed to encode refreshed token pair");
                return;
            }
        };
        if let Err(e) = self.backend.set(&self.slot, &payload) {
            warn!(slot = %self.slot, error = %e, "Failed to persist refreshed access token");
        }
    }
}
