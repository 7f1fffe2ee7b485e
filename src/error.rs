// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client error taxonomy.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;

/// Field name -> messages, exactly as the server reported them.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced by the session service, the interceptor and the resource clients.
///
/// `Clone` is required: one refresh outcome is delivered to every request
/// queued behind it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("unauthorized after token refresh: {0}")]
    Unauthorized(String),

    #[error("validation failed (HTTP {status}): {}", summarize(.errors))]
    ValidationFailed { status: u16, errors: FieldErrors },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Classify a non-2xx response from a resource endpoint.
    ///
    /// 401 is returned as `Unauthorized`; whether it gets refreshed is the
    /// interceptor's decision, not this function's.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let payload: Option<Value> = serde_json::from_str(body).ok();
        match status.as_u16() {
            401 => ClientError::Unauthorized(detail_or_body(payload.as_ref(), body)),
            403 => ClientError::Http {
                status: 403,
                message: detail_or_body(payload.as_ref(), body),
            },
            code @ 400..=499 => ClientError::ValidationFailed {
                status: code,
                errors: payload
                    .as_ref()
                    .map(field_errors_from_payload)
                    .unwrap_or_else(|| body_as_detail(body)),
            },
            code => ClientError::Http {
                status: code,
                message: detail_or_body(payload.as_ref(), body),
            },
        }
    }

    /// Read the body of a failed response and classify it.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    /// HTTP status carried by this error, if it came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::InvalidCredentials(_) | ClientError::Unauthorized(_) => Some(401),
            ClientError::ValidationFailed { status, .. } | ClientError::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// True when the user has to authenticate again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::SessionExpired(_)
                | ClientError::NotAuthenticated
                | ClientError::Unauthorized(_)
        )
    }

    /// Field-level messages flattened to `field: message` lines.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ClientError::ValidationFailed { errors, .. } => flatten(errors),
            other => vec![other.to_string()],
        }
    }

    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::InvalidCredentials(_) => {
                "Incorrect username or password. Please check your credentials.".to_string()
            }
            ClientError::NetworkUnavailable(_) => {
                "Connection error. Check your internet connection and try again.".to_string()
            }
            ClientError::SessionExpired(_) | ClientError::Unauthorized(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            ClientError::NotAuthenticated => "You are not logged in.".to_string(),
            ClientError::ValidationFailed { errors, .. } => flatten(errors).join("\n"),
            ClientError::Http { message, .. } => format!("Error: {message}"),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            // No usable response reached us: connect, timeout, TLS, redirect loop.
            ClientError::NetworkUnavailable(e.to_string())
        }
    }
}

impl From<crate::storage::StorageError> for ClientError {
    fn from(e: crate::storage::StorageError) -> Self {
        ClientError::Storage(e.to_string())
    }
}

/// Build field errors from a server payload, keeping messages verbatim.
///
/// `{"email": ["Enter a valid email address."]}` and `{"detail": "Not found."}`
/// are both accepted; nested values are kept as their JSON text.
pub fn field_errors_from_payload(payload: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match payload {
        Value::Object(map) => {
            for (field, value) in map {
                errors.insert(field.clone(), messages_of(value));
            }
        }
        Value::Array(_) => {
            errors.insert("non_field_errors".to_string(), messages_of(payload));
        }
        Value::Null => {}
        other => {
            errors.insert("detail".to_string(), messages_of(other));
        }
    }
    errors
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        other => vec![other.to_string()],
    }
}

fn body_as_detail(body: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        errors.insert("detail".to_string(), vec![trimmed.to_string()]);
    }
    errors
}

fn detail_or_body(payload: Option<&Value>, body: &str) -> String {
    payload
        .and_then(|p| p.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

fn flatten(errors: &FieldErrors) -> Vec<String> {
    errors
        .iter()
        .flat_map(|(field, messages)| {
            messages.iter().map(move |message| {
                if field == "detail" || field == "non_field_errors" {
                    message.clone()
                } else {
                    format!("{field}: {message}")
                }
            })
        })
        .collect()
}

fn summarize(errors: &FieldErrors) -> String {
    let lines = flatten(errors);
    if lines.is_empty() {
        "no details".to_string()
    } else {
        lines.join("; ")
    }
}
