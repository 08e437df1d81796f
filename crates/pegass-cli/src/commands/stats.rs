use chrono::NaiveDate;
use clap::Subcommand;
use pegass_core::roster::year_range;
use pegass_core::DateRange;
use serde_json::json;
use std::path::Path;

use crate::common::{block_on, connect, load_config, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Dispatch shifts per dispatcher over a calendar year
    Dispatchers {
        /// Calendar year (e.g. 2024)
        #[arg(long)]
        year: i32,
    },
    /// Per-member dispatch, evaluation and radio counters over a period
    Export {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
    },
    /// Activity counts of one member over a period
    Member {
        /// Member key
        id: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
}

pub fn run(action: StatsAction, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;

    block_on(async move {
        let client = connect(config).await?;
        match action {
            StatsAction::Dispatchers { year } => {
                let counts = client.dispatcher_shift_counts(year_range(year)?).await?;
                let rows: Vec<_> = counts
                    .iter()
                    .map(|(member, shifts)| {
                        json!({ "id": member.id, "name": member.name(), "dispatch_shifts": shifts })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            StatsAction::Export { from, to } => {
                let stats = client.fetch_aggregated_stats(DateRange::new(from, to)?).await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            StatsAction::Member { id, from, to } => {
                let stats = client.member_stats(&id, DateRange::new(from, to)?).await?;
                for ((group, activity), count) in &stats.by_activity {
                    println!("{group}\t{activity}\t{count}");
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?
}
