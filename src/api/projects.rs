// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::{
    auth::{ApiRequest, AuthInterceptor},
    error::ClientError,
    models::{Project, ProjectInput, ProjectStatus},
};

/// Collection path for projects.
pub const PROJECTS_PATH: &str = "/projects/";

/// Status-filtered listing.
pub const PROJECTS_BY_STATUS_PATH: &str = "/projects/by_status/";

/// CRUD calls on `/projects/`, plus the status filter.
#[derive(Clone)]
pub struct ProjectsApi {
    interceptor: AuthInterceptor,
}

impl ProjectsApi {
    pub fn new(interceptor: AuthInterceptor) -> Self {
        Self { interceptor }
    }

    pub async fn list(&self) -> Result<Vec<Project>, ClientError> {
        self.interceptor
            .send_json(ApiRequest::get(PROJECTS_PATH))
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Project, ClientError> {
        self.interceptor
            .send_json(ApiRequest::get(project_path(id)))
            .await
    }

    pub async fn create(&self, input: &ProjectInput) -> Result<Project, ClientError> {
        let request = ApiRequest::post(PROJECTS_PATH).with_body(input)?;
        self.interceptor.send_json(request).await
    }

    pub async fn update(&self, id: i64, input: &ProjectInput) -> Result<Project, ClientError> {
        let request = ApiRequest::put(project_path(id)).with_body(input)?;
        self.interceptor.send_json(request).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.interceptor
            .send_empty(ApiRequest::delete(project_path(id)))
            .await
    }

    /// Projects in the given status.
    pub async fn by_status(&self, status: ProjectStatus) -> Result<Vec<Project>, ClientError> {
        let request =
            ApiRequest::get(PROJECTS_BY_STATUS_PATH).with_query("status", status.as_str());
        self.interceptor.send_json(request).await
    }
}

fn project_path(id: i64) -> String {
    format!("{PROJECTS_PATH}{id}/")
}
