use clap::Subcommand;
use pegass_core::PegassClient;
use std::path::Path;

use crate::common::{block_on, connect, load_config, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Run the full SSO handshake and store the session ticket
    Login,
    /// Probe the stored session, logging in again if it expired
    Check,
    /// Show the logged-in member
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: AuthAction, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;

    match action {
        AuthAction::Login => {
            let client = PegassClient::from_config(config)?;
            block_on(client.authenticate())??;
            println!("session ticket stored");
        }
        AuthAction::Check => {
            let client = PegassClient::from_config(config)?;
            let renewed = block_on(async {
                match client.restore_session().await {
                    Ok(()) => client.reauthenticate_if_necessary().await,
                    Err(_) => client.authenticate().await.map(|()| true),
                }
            })??;
            if renewed {
                println!("session renewed");
            } else {
                println!("session valid");
            }
        }
        AuthAction::Whoami { json } => {
            let user = block_on(async {
                let client = connect(config).await?;
                Ok::<_, Box<dyn std::error::Error>>(client.current_user().await?)
            })??;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("{} ({})", user.name(), user.id);
                if let Some(structure) = &user.structure {
                    println!("structure: {}", structure.name);
                }
            }
        }
    }
    Ok(())
}
