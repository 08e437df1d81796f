use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "pegass-cli", version, about = "Pegass CLI")]
struct Cli {
    /// Read this config file instead of ~/.config/pegass/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Roster queries
    Roster {
        #[command(subcommand)]
        action: commands::roster::RosterAction,
    },
    /// Dispatch statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Print the activity digest of one day
    Summary(commands::summary::SummaryArgs),
    /// Deliver digests to chat recipients
    Digest {
        #[command(subcommand)]
        action: commands::digest::DigestAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if std::env::var_os("VERBOSE").is_some() {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action, config),
        Commands::Config { action } => commands::config::run(action, config),
        Commands::Roster { action } => commands::roster::run(action, config),
        Commands::Stats { action } => commands::stats::run(action, config),
        Commands::Summary(args) => commands::summary::run(args, config),
        Commands::Digest { action } => commands::digest::run(action, config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
