use chrono::NaiveDate;
use clap::Args;
use pegass_core::ActivityKind;
use std::path::Path;

use crate::common::{block_on, connect, load_config, today, CliResult};

#[derive(Args)]
pub struct SummaryArgs {
    /// Day to summarize (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub day: Option<NaiveDate>,
    /// samu (medical-dispatch) or bspp (fire-brigade)
    #[arg(long, default_value = "samu")]
    pub kind: ActivityKind,
    /// Only headers and time ranges, no registrant lookups
    #[arg(long)]
    pub brief: bool,
}

pub fn run(args: SummaryArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;

    let text = block_on(async move {
        let client = connect(config).await?;
        let day = args.day.unwrap_or_else(|| today(&client));
        Ok::<_, Box<dyn std::error::Error>>(client.summarize(day, args.kind, args.brief).await?)
    })??;
    println!("{text}");
    Ok(())
}
