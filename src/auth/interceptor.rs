// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated request dispatch with refresh-on-401.
//!
//! ## Refresh cycle
//!
//! ```text
//! IDLE --401 (not retried)--> REFRESHING    leader marks itself retried,
//!                                           spawns the refresh task
//! REFRESHING --401--> REFRESHING            follower parks a oneshot sender
//! REFRESHING --refresh ok--> IDLE           store access updated, followers
//!                                           then leader replay with new token
//! REFRESHING --refresh failed--> IDLE       store cleared, everyone rejected
//! ```
//!
//! At most one refresh call is in flight. The flag and the FIFO queue share a
//! single mutex that is never held across an `.await`. The refresh itself runs
//! in a spawned task, so dropping a caller's future cannot leave the cycle
//! half-finished.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::session::SessionState;
use crate::auth::token_store::TokenStore;
use crate::error::ClientError;

/// Refresh endpoint.
pub const REFRESH_PATH: &str = "/token/refresh/";

/// New access token, or the reason the refresh failed.
type RefreshOutcome = Result<String, ClientError>;

/// Sender half handed to a request waiting on the refresh cycle.
type RefreshWaiter = oneshot::Sender<RefreshOutcome>;

/// A logical API call. Replays reuse method, path, query and body; only the
/// bearer token changes.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    id: Uuid,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn with_body<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }
}

#[derive(Default)]
struct RefreshCoordination {
    refreshing: bool,
    pending: VecDeque<RefreshWaiter>,
}

impl RefreshCoordination {
    /// Leave `REFRESHING` and hand back the parked waiters in arrival order.
    fn finish(&mut self) -> VecDeque<RefreshWaiter> {
        self.refreshing = false;
        std::mem::take(&mut self.pending)
    }
}

/// Deliver one outcome to every follower in queue order, then to the leader.
fn release(followers: VecDeque<RefreshWaiter>, leader: RefreshWaiter, outcome: RefreshOutcome) {
    // A closed receiver means that caller went away; nothing to deliver.
    for follower in followers {
        let _ = follower.send(outcome.clone());
    }
    let _ = leader.send(outcome);
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

/// Wraps outbound API calls with bearer auth and the refresh cycle.
///
/// Clones share the coordination state, so every clone observes the same
/// in-flight refresh.
#[derive(Clone)]
pub struct AuthInterceptor {
    http: Client,
    base_url: String,
    store: TokenStore,
    session: Arc<watch::Sender<SessionState>>,
    coordination: Arc<Mutex<RefreshCoordination>>,
}

impl AuthInterceptor {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        store: TokenStore,
        session: Arc<watch::Sender<SessionState>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            store,
            session,
            coordination: Arc::new(Mutex::new(RefreshCoordination::default())),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Whether a refresh call is currently outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.lock_coordination().refreshing
    }

    /// Number of requests parked behind the in-flight refresh.
    pub fn queued(&self) -> usize {
        self.lock_coordination().pending.len()
    }

    /// Send a request, refreshing the access token once on 401.
    ///
    /// Returns the successful response; every non-2xx outcome is an error.
    pub async fn send(&self, mut request: ApiRequest) -> Result<Response, ClientError> {
        let mut access = self.store.access().ok_or(ClientError::NotAuthenticated)?;

        loop {
            let response = self.dispatch(&request, &access).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let rejection = ClientError::from_response(response).await;
            if status != StatusCode::UNAUTHORIZED {
                return Err(rejection);
            }

            let replacement = self.recover(&mut request, &access, rejection).await?;
            access = replacement;
            debug!(
                request_id = %request.id,
                method = %request.method,
                path = %request.path,
                "Replaying request with refreshed token"
            );
        }
    }

    /// Send a request and decode the JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send a request and discard the response body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ClientError> {
        self.send(request).await.map(|_| ())
    }

    async fn dispatch(&self, request: &ApiRequest, access: &str) -> Result<Response, ClientError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.endpoint(&request.path))
            .bearer_auth(access);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| {
            warn!(
                request_id = %request.id,
                method = %request.method,
                path = %request.path,
                error = %e,
                "Request failed without a response"
            );
            ClientError::NetworkUnavailable(e.to_string())
        })
    }

    /// Handle a 401 for a request sent with `rejected_access`: lead or join a
    /// refresh cycle and return the token to replay with.
    ///
    /// If the stored access token already differs from the rejected one, a
    /// refresh finished while the request was in flight and the stored token
    /// is returned without refreshing again.
    async fn recover(
        &self,
        request: &mut ApiRequest,
        rejected_access: &str,
        rejection: ClientError,
    ) -> Result<String, ClientError> {
        if request.retried {
            warn!(
                request_id = %request.id,
                path = %request.path,
                "Request rejected again after token refresh"
            );
            return Err(rejection);
        }

        // Read the store under the lock: a cycle writes its token before it
        // clears the flag, so IDLE implies the store holds the latest token.
        let (tx, rx) = oneshot::channel();
        let leader = {
            let mut coordination = self.lock_coordination();
            if coordination.refreshing {
                coordination.pending.push_back(tx);
                debug!(
                    request_id = %request.id,
                    queued = coordination.pending.len(),
                    "Refresh in flight; queueing request"
                );
                None
            } else {
                let Some(pair) = self.store.load() else {
                    drop(coordination);
                    warn!(
                        request_id = %request.id,
                        "No token pair available for refresh; clearing session"
                    );
                    self.expire_session();
                    return Err(ClientError::SessionExpired(
                        "no refresh token available".to_string(),
                    ));
                };
                if pair.access != rejected_access {
                    debug!(
                        request_id = %request.id,
                        "Access token changed since dispatch; replaying without refresh"
                    );
                    return Ok(pair.access);
                }
                coordination.refreshing = true;
                Some((tx, pair.refresh))
            }
        };

        if let Some((tx, refresh)) = leader {
            request.retried = true;
            info!(request_id = %request.id, "Access token rejected; refreshing");
            tokio::spawn(self.clone().run_refresh_cycle(refresh, tx));
        }

        rx.await.unwrap_or_else(|_| {
            Err(ClientError::SessionExpired(
                "refresh cycle ended without an outcome".to_string(),
            ))
        })
    }

    async fn run_refresh_cycle(self, refresh: String, leader: RefreshWaiter) {
        let outcome = self.request_refresh(&refresh).await;
        match &outcome {
            Ok(access) => {
                self.store.update_access_only(access);
                info!("Access token refreshed");
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed; clearing session");
                self.expire_session();
            }
        }

        let followers = self.lock_coordination().finish();
        debug!(released = followers.len(), ok = outcome.is_ok(), "Releasing queued requests");
        release(followers, leader, outcome);
    }

    async fn request_refresh(&self, refresh: &str) -> RefreshOutcome {
        let response = self
            .http
            .post(self.endpoint(REFRESH_PATH))
            .json(&RefreshRequest { refresh })
            .send()
            .await
            .map_err(|e| ClientError::SessionExpired(format!("refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let err = ClientError::from_response(response).await;
            return Err(ClientError::SessionExpired(format!(
                "refresh rejected with HTTP {}: {err}",
                status.as_u16()
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ClientError::SessionExpired(format!("refresh response unreadable: {e}")))?;
        match body.access {
            Some(access) if !access.is_empty() => Ok(access),
            _ => Err(ClientError::SessionExpired(
                "refresh response did not include an access token".to_string(),
            )),
        }
    }

    fn expire_session(&self) {
        self.store.clear();
        self.session.send_replace(SessionState::Unauthenticated);
    }

    fn lock_coordination(&self) -> MutexGuard<'_, RefreshCoordination> {
        self.coordination.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
