// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth session service: login, registration, logout and startup bootstrap.
//!
//! The session publishes its state on a `watch` channel. It starts as
//! [`SessionState::Loading`] so a host never renders an authenticated or
//! unauthenticated view before [`AuthSession::bootstrap`] has run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::claims::{self, DEFAULT_EXPIRY_SKEW};
use crate::auth::token_store::{TokenPair, TokenStore};
use crate::error::ClientError;
use crate::models::{NewUser, User};

/// Credential endpoint.
pub const TOKEN_PATH: &str = "/token/";

/// Registration endpoint.
pub const USERS_PATH: &str = "/users/";

/// Authentication state observed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Bootstrap has not run yet
    Loading,
    Authenticated,
    Unauthenticated,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

/// Session service shared by the host and the interceptor.
///
/// Clones share the store, the state channel and the bootstrap flag.
#[derive(Clone)]
pub struct AuthSession {
    http: Client,
    base_url: String,
    store: TokenStore,
    expiry_skew: Duration,
    state: Arc<watch::Sender<SessionState>>,
    bootstrapped: Arc<AtomicBool>,
}

impl AuthSession {
    pub fn new(http: Client, base_url: impl Into<String>, store: TokenStore) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            http,
            base_url: base_url.into(),
            store,
            expiry_skew: DEFAULT_EXPIRY_SKEW,
            state: Arc::new(state),
            bootstrapped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the validator skew used by bootstrap.
    pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
        self.expiry_skew = skew;
        self
    }

    /// State channel, shared with the interceptor so it can force a logout.
    pub fn state_sender(&self) -> Arc<watch::Sender<SessionState>> {
        Arc::clone(&self.state)
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Decide the initial state from the persisted tokens.
    ///
    /// Runs once; later calls return the current state unchanged.
    pub fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return self.state();
        }

        let next = match self.store.access() {
            None => SessionState::Unauthenticated,
            Some(access) if claims::is_expired_with_skew(Some(&access), self.expiry_skew) => {
                info!("Stored access token is expired; clearing session");
                self.store.clear();
                SessionState::Unauthenticated
            }
            Some(_) => SessionState::Authenticated,
        };

        debug!(state = ?next, "Session bootstrap complete");
        self.state.send_replace(next);
        next
    }

    /// Exchange credentials for a token pair and persist it.
    ///
    /// Nothing is written to the store unless the server returns both tokens.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ClientError> {
        let response = self
            .http
            .post(self.endpoint(TOKEN_PATH))
            .json(&Credentials { username, password })
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let err = match ClientError::from_response(response).await {
                ClientError::Unauthorized(detail) => ClientError::InvalidCredentials(detail),
                other => other,
            };
            warn!(username = %username, error = %err, "Login rejected");
            return Err(err);
        }

        let body: TokenResponse = response.json().await?;
        let pair = match (body.access, body.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                TokenPair::new(access, refresh)
            }
            _ => {
                return Err(ClientError::InvalidResponse(
                    "token response is missing access or refresh".to_string(),
                ))
            }
        };

        self.store.save(&pair)?;
        self.bootstrapped.store(true, Ordering::SeqCst);
        self.state.send_replace(SessionState::Authenticated);
        info!(username = %username, "Logged in");
        Ok(pair)
    }

    /// Create an account. Does not authenticate the session.
    pub async fn register(&self, new_user: &NewUser) -> Result<User, ClientError> {
        let response = self
            .http
            .post(self.endpoint(USERS_PATH))
            .json(new_user)
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let user: User = response.json().await?;
        info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Register, then log in with the same credentials.
    pub async fn register_and_login(
        &self,
        new_user: &NewUser,
    ) -> Result<(User, TokenPair), ClientError> {
        let user = self.register(new_user).await?;
        let pair = self.login(&new_user.username, &new_user.password).await?;
        Ok((user, pair))
    }

    /// Drop the local session. Never calls the server.
    pub fn logout(&self) {
        self.store.clear();
        self.bootstrapped.store(true, Ordering::SeqCst);
        self.state.send_replace(SessionState::Unauthenticated);
        info!("Logged out");
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::tests::jwt_expiring_at;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(base_url: &str) -> AuthSession {
        let store = TokenStore::new(Arc::new(MemoryStore::new()));
        AuthSession::new(Client::new(), base_url, store)
    }

    #[test]
    fn starts_in_loading_state() {
        let session = session_for("http://localhost:8000/api");
        assert_eq!(session.state(), SessionState::Loading);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn bootstrap_without_token_is_unauthenticated() {
        let session = session_for("http://localhost:8000/api");
        assert_eq!(session.bootstrap(), SessionState::Unauthenticated);
    }

    #[test]
    fn bootstrap_with_valid_token_is_authenticated() {
        let session = session_for("http://localhost:8000/api");
        let access = jwt_expiring_at(Utc::now().timestamp() + 3600);
        session.store().save(&TokenPair::new(access, "r1")).unwrap();

        assert_eq!(session.bootstrap(), SessionState::Authenticated);
        assert!(session.is_authenticated());
        assert!(session.store().load().is_some());
    }

    #[test]
    fn bootstrap_with_expired_token_clears_store() {
        let session = session_for("http://localhost:8000/api");
        let access = jwt_expiring_at(Utc::now().timestamp() - 1000);
        session.store().save(&TokenPair::new(access, "r1")).unwrap();

        assert_eq!(session.bootstrap(), SessionState::Unauthenticated);
        assert!(session.store().load().is_none());
    }

    #[test]
    fn bootstrap_runs_once() {
        let session = session_for("http://localhost:8000/api");
        assert_eq!(session.bootstrap(), SessionState::Unauthenticated);

        let access = jwt_expiring_at(Utc::now().timestamp() + 3600);
        session.store().save(&TokenPair::new(access, "r1")).unwrap();
        assert_eq!(session.clone().bootstrap(), SessionState::Unauthenticated);
    }

    #[test]
    fn subscribers_observe_transitions() {
        let session = session_for("http://localhost:8000/api");
        let rx = session.subscribe();
        session.bootstrap();
        assert_eq!(*rx.borrow(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn login_persists_pair_and_authenticates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .and(body_json(json!({"username": "demo", "password": "secret"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let pair = session.login("demo", "secret").await.unwrap();

        assert_eq!(pair, TokenPair::new("a1", "r1"));
        assert_eq!(session.store().load(), Some(TokenPair::new("a1", "r1")));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn login_with_bad_credentials_leaves_store_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "No active account found with the given credentials"
            })))
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        session.store().save(&TokenPair::new("old", "old-r")).unwrap();

        let err = session.login("demo", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidCredentials(ref detail)
                if detail == "No active account found with the given credentials"
        ));
        assert_eq!(session.store().load(), Some(TokenPair::new("old", "old-r")));
    }

    #[tokio::test]
    async fn login_response_without_refresh_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a1"})))
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let err = session.login("demo", "secret").await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidResponse(_)));
        assert!(session.store().load().is_none());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn login_without_server_is_network_unavailable() {
        let session = session_for("http://127.0.0.1:1/api");
        let err = session.login("demo", "secret").await.unwrap_err();
        assert!(matches!(err, ClientError::NetworkUnavailable(_)));
    }

    #[tokio::test]
    async fn register_returns_user_without_authenticating() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 5,
                "username": "nuevouser",
                "email": "nuevo@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let user = session
            .register(&NewUser {
                username: "nuevouser".to_string(),
                email: "nuevo@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, 5);
        assert!(session.store().load().is_none());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn register_surfaces_field_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "username": ["A user with that username already exists."]
            })))
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let err = session
            .register(&NewUser {
                username: "demo".to_string(),
                email: "demo@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.messages(),
            vec!["username: A user with that username already exists.".to_string()]
        );
    }

    #[tokio::test]
    async fn register_and_login_authenticates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 9,
                "username": "demo",
                "email": "demo@example.com"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server.uri());
        let (user, pair) = session
            .register_and_login(&NewUser {
                username: "demo".to_string(),
                email: "demo@example.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, 9);
        assert_eq!(pair.refresh, "r1");
        assert!(session.is_authenticated());
    }

    #[test]
    fn logout_always_succeeds() {
        let session = session_for("http://localhost:8000/api");
        session.logout();
        assert_eq!(session.state(), SessionState::Unauthenticated);

        session.store().save(&TokenPair::new("a1", "r1")).unwrap();
        session.logout();
        assert!(session.store().load().is_none());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }
}
