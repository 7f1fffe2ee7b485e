// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response representations exchanged with the REST API.
//!
//! ## Model Categories
//!
//! - **Users**: Registration payload and the created-user representation
//! - **Clients**: Customer records owned by the authenticated user
//! - **Projects**: Work items attached to a client, filterable by status

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User Models
// =============================================================================

/// Registration payload for `POST /users/`.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A registered user. The server never returns the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

// =============================================================================
// Client Models
// =============================================================================

/// A client record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Owning user ID (assigned by the server)
    #[serde(default)]
    pub user: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable fields of a client, used for create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

// =============================================================================
// Project Models
// =============================================================================

/// Project lifecycle status, as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "en_progreso")]
    InProgress,
    #[serde(rename = "completado")]
    Completed,
}

impl ProjectStatus {
    /// Wire value, also used for the `status` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pendiente",
            ProjectStatus::InProgress => "en_progreso",
            ProjectStatus::Completed => "completado",
        }
    }

    /// Parse either the wire value or the English name (case-insensitive).
    pub fn parse(s: &str) -> Option<ProjectStatus> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" | "pending" => Some(ProjectStatus::Pending),
            "en_progreso" | "in_progress" | "in-progress" => Some(ProjectStatus::InProgress),
            "completado" | "completed" => Some(ProjectStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Client ID this project belongs to
    pub client: i64,
    /// Read-only convenience field filled in by the server
    #[serde(default)]
    pub client_name: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable fields of a project, used for create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectInput {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    pub client: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_status_uses_wire_names() {
        assert_eq!(
            serde_json::to_value(ProjectStatus::InProgress).unwrap(),
            json!("en_progreso")
        );
        let parsed: ProjectStatus = serde_json::from_value(json!("completado")).unwrap();
        assert_eq!(parsed, ProjectStatus::Completed);
        assert_eq!(ProjectStatus::default(), ProjectStatus::Pending);
    }

    #[test]
    fn project_status_parse_accepts_both_spellings() {
        assert_eq!(ProjectStatus::parse("pendiente"), Some(ProjectStatus::Pending));
        assert_eq!(ProjectStatus::parse("In_Progress"), Some(ProjectStatus::InProgress));
        assert_eq!(ProjectStatus::parse("completed"), Some(ProjectStatus::Completed));
        assert_eq!(ProjectStatus::parse("archived"), None);
    }

    #[test]
    fn project_deserializes_server_representation() {
        let project: Project = serde_json::from_value(json!({
            "id": 7,
            "name": "Website",
            "description": "Landing page redesign",
            "status": "en_progreso",
            "client": 3,
            "client_name": "ACME",
            "start_date": "2024-01-15",
            "end_date": null,
            "created_at": "2024-01-15T10:00:00.123456Z",
            "updated_at": "2024-01-16T08:30:00Z"
        }))
        .unwrap();

        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.client_name.as_deref(), Some("ACME"));
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(project.end_date.is_none());
    }

    #[test]
    fn client_deserializes_without_user() {
        let client: Client = serde_json::from_value(json!({
            "id": 1,
            "name": "ACME",
            "email": "ops@acme.test",
            "phone": "555-0100",
            "created_at": "2024-01-15T10:00:00Z",
            "updated_at": "2024-01-15T10:00:00Z"
        }))
        .unwrap();
        assert!(client.user.is_none());
    }

    #[test]
    fn new_user_serializes_password() {
        let body = serde_json::to_value(NewUser {
            username: "nuevouser".to_string(),
            email: "nuevo@example.com".to_string(),
            password: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(body["password"], "secret");
    }
}
