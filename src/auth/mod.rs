// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Client-side token lifecycle for the REST API.
//!
//! ## Auth Flow
//!
//! 1. `POST /token/` exchanges username/password for an access/refresh pair
//! 2. The pair is persisted in a single storage slot
//! 3. Every API call carries `Authorization: Bearer <access>`
//! 4. On 401 the interceptor:
//!    - runs one `POST /token/refresh/` for all concurrent failures
//!    - replays each failed request once with the new access token
//!    - clears the session when refresh is impossible or fails
//!
//! ## Expiry
//!
//! - Access tokens are JWTs; only the `exp` claim is read, unverified
//! - The session bootstrap drops tokens older than `exp + 10s`
//! - Undecodable tokens count as expired

pub mod claims;
pub mod interceptor;
pub mod session;
pub mod token_store;

pub use claims::{is_expired, AccessClaims};
pub use interceptor::{ApiRequest, AuthInterceptor};
pub use session::{AuthSession, SessionState};
pub use token_store::{TokenPair, TokenStore};
