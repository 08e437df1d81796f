use clap::Subcommand;
use pegass_core::RosterEntry;
use std::path::Path;

use crate::common::{block_on, connect, load_config, CliResult};

#[derive(Subcommand)]
pub enum RosterAction {
    /// Members holding the dispatcher skill
    Dispatchers {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Members holding a catalogue role, looked up by its exact label
    Role {
        /// Role label (e.g. "PSE2")
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Member detail
    Member {
        /// Member key
        id: String,
    },
    /// Mobile phone of a member
    Phone {
        /// Member key
        id: String,
    },
    /// Training history of a member
    Trainings {
        /// Member key
        id: String,
    },
    /// Local units of a department
    Structures {
        /// Department id; defaults to the configured one
        #[arg(long)]
        department: Option<String>,
    },
}

fn print_members(members: &[RosterEntry], json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(members)?);
        return Ok(());
    }
    for member in members {
        println!(
            "{}\t{}\t{}",
            member.id,
            member.name(),
            member.mobile_phone().unwrap_or("-")
        );
    }
    eprintln!("{} member(s)", members.len());
    Ok(())
}

pub fn run(action: RosterAction, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;

    block_on(async move {
        let client = connect(config).await?;
        match action {
            RosterAction::Dispatchers { json } => {
                let members = client.fetch_dispatchers().await?;
                print_members(&members, json)?;
            }
            RosterAction::Role { name, json } => {
                let role = client.find_role_by_name(&name).await?;
                let members = client.fetch_users_for_role(&role).await?;
                print_members(&members, json)?;
            }
            RosterAction::Member { id } => {
                let member = client.member(&id).await?;
                println!("{}", serde_json::to_string_pretty(&member)?);
            }
            RosterAction::Phone { id } => match client.mobile_phone(&id).await? {
                Some(phone) => println!("{phone}"),
                None => {
                    eprintln!("no mobile phone for {id}");
                    std::process::exit(1);
                }
            },
            RosterAction::Trainings { id } => {
                for training in client.trainings(&id).await? {
                    let refresher = if training.refresher { " (refresher)" } else { "" };
                    println!("{}{refresher}", training.code);
                }
            }
            RosterAction::Structures { department } => {
                let department =
                    department.unwrap_or_else(|| client.config().roster.department.clone());
                for (id, name) in client.structure_names(&department).await?.iter() {
                    println!("{id}\t{name}");
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?
}
