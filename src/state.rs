// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use reqwest::Client;

use crate::{
    api::{ClientsApi, ProjectsApi},
    auth::{AuthInterceptor, AuthSession, TokenStore},
    config::ClientConfig,
    error::ClientError,
    storage::{FileStore, KeyValueStore, StoragePaths},
};

/// Everything a host needs, wired over one token store and one state channel.
#[derive(Clone)]
pub struct AppState {
    pub session: AuthSession,
    pub interceptor: AuthInterceptor,
    pub clients: ClientsApi,
    pub projects: ProjectsApi,
}

impl AppState {
    /// File-backed state rooted at `config.data_dir`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let backend = Arc::new(FileStore::new(StoragePaths::new(&config.data_dir)));
        Self::with_backend(config, backend)
    }

    /// State over an arbitrary persistence backend.
    pub fn with_backend(
        config: &ClientConfig,
        backend: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url();
        let store = TokenStore::with_slot(backend, config.token_slot.clone());
        let session = AuthSession::new(http.clone(), base_url.clone(), store.clone())
            .with_expiry_skew(config.expiry_skew);
        let interceptor = AuthInterceptor::new(http, base_url, store, session.state_sender());

        Ok(Self {
            clients: ClientsApi::new(interceptor.clone()),
            projects: ProjectsApi::new(interceptor.clone()),
            session,
            interceptor,
        })
    }
}
