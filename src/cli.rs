// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line front-end.
//!
//! Usage:
//! ```bash
//! # Authenticate and persist the token pair
//! clientdesk login --username demo --password secret
//!
//! # Create an account and log straight in
//! clientdesk register --username demo --email demo@example.com --password secret
//!
//! # Browse resources
//! clientdesk clients list
//! clientdesk projects by-status en_progreso
//!
//! # Drop the local session
//! clientdesk logout
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::{
    auth::SessionState,
    error::ClientError,
    models::{ClientInput, NewUser, ProjectInput, ProjectStatus},
    state::AppState,
};

#[derive(Parser)]
#[command(
    name = "clientdesk",
    about = "Client and project manager for the ClientDesk REST API",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// API base URL override
    #[arg(long, global = true)]
    pub api_url: Option<Url>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in and store the token pair
    Login {
        #[arg(long)]
        username: String,

        #[arg(long, env = "CLIENTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account, then log in with it
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "CLIENTDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored tokens
    Logout,

    /// Show whether a session is active
    Status,

    /// Client management
    Clients {
        #[command(subcommand)]
        action: ClientsCommand,
    },

    /// Project management
    Projects {
        #[command(subcommand)]
        action: ProjectsCommand,
    },
}

#[derive(Subcommand)]
pub enum ClientsCommand {
    List,
    Get { id: i64 },
    Create(ClientFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: ClientFields,
    },
    Delete { id: i64 },
}

#[derive(Args)]
pub struct ClientFields {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,
}

impl From<ClientFields> for ClientInput {
    fn from(fields: ClientFields) -> Self {
        ClientInput {
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
        }
    }
}

#[derive(Subcommand)]
pub enum ProjectsCommand {
    List,
    Get { id: i64 },
    Create(ProjectFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProjectFields,
    },
    Delete { id: i64 },
    /// List projects in one status (pendiente, en_progreso, completado)
    ByStatus {
        #[arg(value_parser = parse_status)]
        status: ProjectStatus,
    },
}

#[derive(Args)]
pub struct ProjectFields {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, value_parser = parse_status, default_value = "pendiente")]
    pub status: ProjectStatus,

    /// Owning client ID
    #[arg(long)]
    pub client: i64,

    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: NaiveDate,

    /// YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
}

impl From<ProjectFields> for ProjectInput {
    fn from(fields: ProjectFields) -> Self {
        ProjectInput {
            name: fields.name,
            description: fields.description,
            status: fields.status,
            client: fields.client,
            start_date: fields.start_date,
            end_date: fields.end_date,
        }
    }
}

fn parse_status(raw: &str) -> Result<ProjectStatus, String> {
    ProjectStatus::parse(raw)
        .ok_or_else(|| format!("unknown status '{raw}' (pendiente, en_progreso, completado)"))
}

/// Run one command against a bootstrapped state. Returns the JSON to print.
pub async fn execute(command: Command, state: &AppState) -> Result<Value, ClientError> {
    match command {
        Command::Login { username, password } => {
            state.session.login(&username, &password).await?;
            Ok(json!({"authenticated": true, "username": username}))
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let new_user = NewUser {
                username,
                email,
                password,
            };
            let (user, _) = state.session.register_and_login(&new_user).await?;
            Ok(json!({"authenticated": true, "user": to_output(&user)?}))
        }
        Command::Logout => {
            state.session.logout();
            Ok(json!({"authenticated": false}))
        }
        Command::Status => Ok(status_output(state.session.state())),
        Command::Clients { action } => {
            require_session(state)?;
            run_clients(action, state).await
        }
        Command::Projects { action } => {
            require_session(state)?;
            run_projects(action, state).await
        }
    }
}

async fn run_clients(action: ClientsCommand, state: &AppState) -> Result<Value, ClientError> {
    let api = &state.clients;
    match action {
        ClientsCommand::List => to_output(&api.list().await?),
        ClientsCommand::Get { id } => to_output(&api.get(id).await?),
        ClientsCommand::Create(fields) => to_output(&api.create(&fields.into()).await?),
        ClientsCommand::Update { id, fields } => {
            to_output(&api.update(id, &fields.into()).await?)
        }
        ClientsCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(json!({"deleted": id}))
        }
    }
}

async fn run_projects(action: ProjectsCommand, state: &AppState) -> Result<Value, ClientError> {
    let api = &state.projects;
    match action {
        ProjectsCommand::List => to_output(&api.list().await?),
        ProjectsCommand::Get { id } => to_output(&api.get(id).await?),
        ProjectsCommand::Create(fields) => to_output(&api.create(&fields.into()).await?),
        ProjectsCommand::Update { id, fields } => {
            to_output(&api.update(id, &fields.into()).await?)
        }
        ProjectsCommand::Delete { id } => {
            api.delete(id).await?;
            Ok(json!({"deleted": id}))
        }
        ProjectsCommand::ByStatus { status } => to_output(&api.by_status(status).await?),
    }
}

fn require_session(state: &AppState) -> Result<(), ClientError> {
    if state.session.is_authenticated() {
        Ok(())
    } else {
        Err(ClientError::NotAuthenticated)
    }
}

fn status_output(state: SessionState) -> Value {
    let label = match state {
        SessionState::Loading => "loading",
        SessionState::Authenticated => "authenticated",
        SessionState::Unauthenticated => "unauthenticated",
    };
    json!({"authenticated": state == SessionState::Authenticated, "state": label})
}

fn to_output<T: Serialize>(value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenPair;
    use crate::config::ClientConfig;
    use crate::storage::MemoryStore;
    use clap::CommandFactory;
    use std::sync::Arc;

    fn offline_state() -> AppState {
        AppState::with_backend(&ClientConfig::default(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_project_creation() {
        let cli = Cli::try_parse_from([
            "clientdesk",
            "projects",
            "create",
            "--name",
            "Website",
            "--client",
            "3",
            "--start-date",
            "2024-01-15",
            "--status",
            "in_progress",
        ])
        .unwrap();

        let Command::Projects {
            action: ProjectsCommand::Create(fields),
        } = cli.command
        else {
            panic!("expected projects create");
        };
        let input: ProjectInput = fields.into();
        assert_eq!(input.status, ProjectStatus::InProgress);
        assert_eq!(input.description, "");
        assert_eq!(input.end_date, None);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["clientdesk", "projects", "by-status", "archived"]).is_err());
    }

    #[tokio::test]
    async fn resource_commands_require_a_session() {
        let state = offline_state();
        state.session.bootstrap();

        let err = execute(
            Command::Clients {
                action: ClientsCommand::List,
            },
            &state,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn status_and_logout_report_session_state() {
        let state = offline_state();
        let access = crate::auth::claims::tests::jwt_expiring_at(chrono::Utc::now().timestamp() + 600);
        state
            .session
            .store()
            .save(&TokenPair::new(access, "r1"))
            .unwrap();
        state.session.bootstrap();

        let status = execute(Command::Status, &state).await.unwrap();
        assert_eq!(status, json!({"authenticated": true, "state": "authenticated"}));

        let logout = execute(Command::Logout, &state).await.unwrap();
        assert_eq!(logout, json!({"authenticated": false}));
        assert!(state.session.store().load().is_none());
    }
}
