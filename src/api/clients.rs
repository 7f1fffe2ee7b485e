// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::{
    auth::{ApiRequest, AuthInterceptor},
    error::ClientError,
    models::{Client, ClientInput},
};

/// Collection path for clients.
pub const CLIENTS_PATH: &str = "/clients/";

/// CRUD calls on `/clients/`.
#[derive(Clone)]
pub struct ClientsApi {
    interceptor: AuthInterceptor,
}

impl ClientsApi {
    pub fn new(interceptor: AuthInterceptor) -> Self {
        Self { interceptor }
    }

    pub async fn list(&self) -> Result<Vec<Client>, ClientError> {
        self.interceptor
            .send_json(ApiRequest::get(CLIENTS_PATH))
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Client, ClientError> {
        self.interceptor
            .send_json(ApiRequest::get(client_path(id)))
            .await
    }

    pub async fn create(&self, input: &ClientInput) -> Result<Client, ClientError> {
        let request = ApiRequest::post(CLIENTS_PATH).with_body(input)?;
        self.interceptor.send_json(request).await
    }

    pub async fn update(&self, id: i64, input: &ClientInput) -> Result<Client, ClientError> {
        let request = ApiRequest::put(client_path(id)).with_body(input)?;
        self.interceptor.send_json(request).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.interceptor
            .send_empty(ApiRequest::delete(client_path(id)))
            .await
    }
}

fn client_path(id: i64) -> String {
    format!("{CLIENTS_PATH}{id}/")
}
