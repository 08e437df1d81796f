//! Plumbing shared by the commands.

use chrono::{NaiveDate, Utc};
use pegass_core::{Config, PegassClient};
use std::error::Error;
use std::future::Future;
use std::path::Path;
use tracing::debug;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

pub fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Drive one future to completion on a fresh runtime.
pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Client with a working session: the stored ticket while it is still
/// accepted, a fresh login otherwise.
pub async fn connect(config: Config) -> CliResult<PegassClient> {
    let client = PegassClient::from_config(config)?;
    match client.restore_session().await {
        Ok(()) => {
            client.reauthenticate_if_necessary().await?;
        }
        Err(err) => {
            debug!(error = %err, "no stored session, logging in");
            client.authenticate().await?;
        }
    }
    Ok(client)
}

/// Today in the client's zone.
pub fn today(client: &PegassClient) -> NaiveDate {
    Utc::now().with_timezone(&client.tz()).date_naive()
}
