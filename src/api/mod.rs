// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed resource clients. Every call goes through the [`AuthInterceptor`].
//!
//! [`AuthInterceptor`]: crate::auth::AuthInterceptor

pub mod clients;
pub mod projects;

pub use clients::ClientsApi;
pub use projects::ProjectsApi;

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use tokio::sync::watch;

    use crate::auth::{AuthInterceptor, SessionState, TokenPair, TokenStore};
    use crate::storage::MemoryStore;

    /// Interceptor against `base_url` holding the pair `a1`/`r1`.
    pub(crate) fn authenticated_interceptor(base_url: &str) -> AuthInterceptor {
        let store = TokenStore::new(Arc::new(MemoryStore::new()));
        store.save(&TokenPair::new("a1", "r1")).unwrap();
        let (tx, _rx) = watch::channel(SessionState::Authenticated);
        AuthInterceptor::new(reqwest::Client::new(), base_url, store, Arc::new(tx))
    }
}
