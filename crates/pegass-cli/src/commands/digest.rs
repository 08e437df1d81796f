use chrono::NaiveDate;
use clap::Subcommand;
use pegass_core::notify::DEFAULT_DAY_COUNT;
use pegass_core::{ActivityKind, DigestService, MessageSink, PegassError};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, error};

use crate::common::{block_on, connect, load_config, today, CliResult};

/// Prints each message to stdout, addressed to its recipient.
struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn send(&self, text: &str, recipient: &str) -> pegass_core::Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "--> {recipient}\n{text}").map_err(|e| PegassError::Delivery {
            recipient: recipient.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Subcommand)]
pub enum DigestAction {
    /// Send a multi-day digest to one recipient
    Send {
        /// Recipient address
        recipient: String,
        /// samu (medical-dispatch) or bspp (fire-brigade)
        #[arg(long, default_value = "samu")]
        kind: ActivityKind,
        /// First day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Number of days
        #[arg(long, default_value_t = DEFAULT_DAY_COUNT)]
        days: u32,
    },
    /// Answer chat commands read from stdin, one message per line
    Listen {
        /// Sender the answers go to
        #[arg(long, default_value = "console")]
        sender: String,
    },
}

pub fn run(action: DigestAction, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;

    block_on(async move {
        let client = connect(config).await?;
        let service = DigestService::new(&client, ConsoleSink);
        match action {
            DigestAction::Send {
                recipient,
                kind,
                from,
                days,
            } => {
                let first_day = from.unwrap_or_else(|| today(&client));
                service
                    .send_activity_summary(&recipient, kind, first_day, days)
                    .await?;
            }
            DigestAction::Listen { sender } => {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let line = line?;
                    match service.handle_message(&line, &sender).await {
                        Ok(true) => {}
                        Ok(false) => debug!("not a command"),
                        // already reported to the sender
                        Err(err) => error!(error = %err, "command failed"),
                    }
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?
}
