use clap::Subcommand;
use pegass_core::Config;
use std::path::Path;

use crate::common::{load_config, CliResult};

const MASK: &str = "********";

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the configuration with secrets masked
    Show,
    /// Verify credentials, endpoints and timezone are usable
    Check,
}

pub fn run(action: ConfigAction, config_path: Option<&Path>) -> CliResult {
    match action {
        ConfigAction::Path => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::path()?,
            };
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let mut config = load_config(config_path)?;
            for secret in [
                &mut config.credentials.password,
                &mut config.credentials.totp_secret,
            ] {
                if !secret.is_empty() {
                    *secret = MASK.to_string();
                }
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Check => {
            let config = load_config(config_path)?;
            config.credentials.ensure_complete()?;
            config.endpoints.idp_base()?;
            config.endpoints.app_base()?;
            config.summary.tz()?;
            println!("ok");
        }
    }
    Ok(())
}
