// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use clap::Parser;
use tracing::debug;

use clientdesk::{
    cli::{self, Cli},
    config::ClientConfig,
    error::ClientError,
    logging,
    state::AppState,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    if let Some(api_url) = cli.api_url.clone() {
        config = config.with_api_url(api_url);
    }

    logging::init_tracing(config.log_format);

    if let Err(e) = run(cli, config).await {
        debug!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), ClientError> {
    let state = AppState::new(&config)?;
    let session_state = state.session.bootstrap();
    debug!(api_url = %config.api_url, state = ?session_state, "Session ready");

    let output = cli::execute(cli.command, &state).await?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| ClientError::Encode(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}
