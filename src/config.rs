// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CLIENTDESK_API_URL` | Base URL of the REST API | `http://localhost:8000/api` |
//! | `CLIENTDESK_DATA_DIR` | Directory holding the token slot | `$HOME/.clientdesk` |
//! | `CLIENTDESK_TOKEN_SLOT` | Storage slot name for the token pair | `user_token` |
//! | `CLIENTDESK_REQUEST_TIMEOUT_SECS` | Per-request timeout, refresh included | `15` |
//! | `CLIENTDESK_EXPIRY_SKEW_MS` | Tolerance used by the expiry check | `10000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `warn` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::claims::DEFAULT_EXPIRY_SKEW;
use crate::auth::token_store::DEFAULT_TOKEN_SLOT;
use crate::error::ClientError;
use crate::logging::LogFormat;
use crate::storage::paths::is_valid_key;
use crate::storage::StoragePaths;

/// Environment variable name for the API base URL.
pub const API_URL_ENV: &str = "CLIENTDESK_API_URL";

/// Environment variable name for the local data directory.
pub const DATA_DIR_ENV: &str = "CLIENTDESK_DATA_DIR";

/// Environment variable name for the token storage slot.
pub const TOKEN_SLOT_ENV: &str = "CLIENTDESK_TOKEN_SLOT";

/// Environment variable name for the HTTP timeout, in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "CLIENTDESK_REQUEST_TIMEOUT_SECS";

/// Environment variable name for the expiry skew, in milliseconds.
pub const EXPIRY_SKEW_ENV: &str = "CLIENTDESK_EXPIRY_SKEW_MS";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub data_dir: PathBuf,
    pub token_slot: String,
    pub request_timeout: Duration,
    pub expiry_skew: Duration,
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            data_dir: StoragePaths::default().root().to_path_buf(),
            token_slot: DEFAULT_TOKEN_SLOT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            expiry_skew: DEFAULT_EXPIRY_SKEW,
            log_format: LogFormat::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(raw) = var(API_URL_ENV) {
            config.api_url = parse_api_url(&raw)?;
        }
        if let Some(raw) = var(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(raw);
        }
        if let Some(raw) = var(TOKEN_SLOT_ENV) {
            if !is_valid_key(&raw) {
                return Err(ClientError::Config(format!(
                    "{TOKEN_SLOT_ENV} must only contain letters, digits, '-' or '_': {raw}"
                )));
            }
            config.token_slot = raw;
        }
        if let Some(raw) = var(REQUEST_TIMEOUT_ENV) {
            let secs = parse_number(REQUEST_TIMEOUT_ENV, &raw)?;
            if secs == 0 {
                return Err(ClientError::Config(format!(
                    "{REQUEST_TIMEOUT_ENV} must be greater than zero"
                )));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = var(EXPIRY_SKEW_ENV) {
            config.expiry_skew = Duration::from_millis(parse_number(EXPIRY_SKEW_ENV, &raw)?);
        }
        if let Some(raw) = var(LOG_FORMAT_ENV) {
            config.log_format = LogFormat::parse(&raw).ok_or_else(|| {
                ClientError::Config(format!("{LOG_FORMAT_ENV} must be 'json' or 'pretty': {raw}"))
            })?;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
        self.expiry_skew = skew;
        self
    }

    /// Base URL without a trailing slash; endpoint paths start with `/`.
    pub fn base_url(&self) -> String {
        self.api_url.as_str().trim_end_matches('/').to_string()
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw)
        .map_err(|e| ClientError::Config(format!("{API_URL_ENV} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "{API_URL_ENV} must use http or https, got {other}"
        ))),
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ClientError> {
    raw.parse()
        .map_err(|_| ClientError::Config(format!("{name} must be a non-negative integer: {raw}")))
}
