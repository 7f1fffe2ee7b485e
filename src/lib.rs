// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ClientDesk - client and project management over a token-authenticated REST API
//!
//! This crate provides the client side of the ClientDesk API: persisted
//! access/refresh tokens, expiry checks, and an interceptor that refreshes
//! the access token once for any number of concurrent 401 responses.
//!
//! ## Modules
//!
//! - `auth` - Token store, expiry check, session service and interceptor
//! - `api` - Typed clients for `/clients/` and `/projects/`
//! - `storage` - Injectable key-value persistence (file and memory)
//! - `cli` - Command-line front-end

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;
