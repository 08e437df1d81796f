//! Digest delivery over a chat transport.
//!
//! The transport is reduced to [`MessageSink`]. [`DigestService`] answers
//! chat commands with one message per day.

use chrono::{Days, NaiveDate, Utc};
use tracing::{error, info};

use crate::client::PegassClient;
use crate::error::{PegassError, Result};
use crate::model::ActivityKind;

/// Days covered by a digest requested from chat.
pub const DEFAULT_DAY_COUNT: u32 = 3;

/// Anything that can deliver a text message to a recipient.
pub trait MessageSink: Send + Sync {
    /// Deliver `text`. Implementations report failures as
    /// [`PegassError::Delivery`].
    fn send(&self, text: &str, recipient: &str) -> Result<()>;
}

/// Digest kind requested by a chat message, if it is a command.
pub fn parse_command(text: &str) -> Option<ActivityKind> {
    match text.trim().to_lowercase().as_str() {
        "!psr" => Some(ActivityKind::MedicalDispatch),
        "!bspp" => Some(ActivityKind::FireBrigade),
        _ => None,
    }
}

/// Heading of the `offset`-th day of a digest.
pub fn day_heading(offset: u32) -> String {
    match offset {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        2 => "Day after tomorrow".to_string(),
        n => format!("In {n} days"),
    }
}

pub struct DigestService<'a, S> {
    client: &'a PegassClient,
    sink: S,
}

impl<'a, S: MessageSink> DigestService<'a, S> {
    pub fn new(client: &'a PegassClient, sink: S) -> Self {
        Self { client, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Send the digest of `day_count` days starting at `first_day`.
    ///
    /// Stops at the first day that cannot be summarized, after telling the
    /// recipient.
    pub async fn send_activity_summary(
        &self,
        recipient: &str,
        kind: ActivityKind,
        first_day: NaiveDate,
        day_count: u32,
    ) -> Result<()> {
        self.sink.send(
            &format!(
                "🤖 Received. Building the {} post status for {day_count} days.",
                kind.display_name()
            ),
            recipient,
        )?;

        for offset in 0..day_count {
            let day = first_day
                .checked_add_days(Days::new(u64::from(offset)))
                .ok_or_else(|| PegassError::NotFound {
                    what: "calendar day",
                    key: format!("{first_day} + {offset}"),
                })?;
            info!(%day, %kind, "building digest");

            let summary = match self.client.summarize(day, kind, false).await {
                Ok(summary) => summary,
                Err(err) => {
                    error!(%day, %kind, error = %err, "digest failed");
                    self.sink.send(
                        "An error occurred while building the network status. Please try again later.",
                        recipient,
                    )?;
                    return Err(err);
                }
            };

            let text = format!("*{}* ({day}):\n{summary}\n", day_heading(offset));
            self.sink.send(&text, recipient)?;
        }
        Ok(())
    }

    /// React to an incoming chat message. Returns whether it was a command.
    pub async fn handle_message(&self, text: &str, sender: &str) -> Result<bool> {
        let Some(kind) = parse_command(text) else {
            return Ok(false);
        };
        info!(%kind, "digest requested");
        self.client.reauthenticate_if_necessary().await?;

        let today = Utc::now().with_timezone(&self.client.tz()).date_naive();
        self.send_activity_summary(sender, kind, today, DEFAULT_DAY_COUNT)
            .await?;
        Ok(true)
    }
}
