// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token claims and expiry detection.
//!
//! The client never holds the signing key, so tokens are decoded without
//! signature verification and only the `exp` claim is read. Anything that
//! fails to decode is treated as expired.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

/// Default tolerance subtracted from "now" before comparing against `exp`.
pub const DEFAULT_EXPIRY_SKEW: Duration = Duration::from_millis(10_000);

/// Claims decoded from an access token payload.
///
/// Derived on demand from the token; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
}

impl AccessClaims {
    /// Decode the payload of a JWT access token.
    ///
    /// Returns `None` for malformed tokens or a missing `exp` claim.
    pub fn decode(token: &str) -> Option<Self> {
        match jsonwebtoken::dangerous::insecure_decode::<AccessClaims>(token) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Access token could not be decoded");
                None
            }
        }
    }

    /// Expiry in Unix milliseconds.
    pub fn expires_at_millis(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }
}

/// Whether the token is expired, using the default skew.
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_with_skew(token, DEFAULT_EXPIRY_SKEW)
}

/// Whether the token is expired, using the wall clock.
pub fn is_expired_with_skew(token: Option<&str>, skew: Duration) -> bool {
    is_expired_at(token, Utc::now().timestamp_millis(), skew)
}

/// Whether the token is expired at `now_millis`.
///
/// Expired means `exp * 1000 < now_millis - skew`. Absent and undecodable
/// tokens are expired.
pub fn is_expired_at(token: Option<&str>, now_millis: i64, skew: Duration) -> bool {
    let Some(claims) = token.and_then(AccessClaims::decode) else {
        return true;
    };
    let skew_millis = i64::try_from(skew.as_millis()).unwrap_or(i64::MAX);
    claims.expires_at_millis() < now_millis.saturating_sub(skew_millis)
}
