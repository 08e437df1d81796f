//! Aggregated dispatch statistics.
//!
//! Walks every completed dispatch occurrence of a period and counts, per
//! member, the shifts spent dispatching, evaluating or on the radio. Role
//! codes here mean something different than in the digest ("1" is a
//! participant), so the mapping has its own table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::api::OccurrenceSearch;
use crate::client::PegassClient;
use crate::error::Result;
use crate::model::DateRange;

/// Counter a stats role code feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatsCounter {
    Dispatch,
    Evaluation,
    RadioOperator,
}

/// Role code -> counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsRoleTable(BTreeMap<String, StatsCounter>);

impl Default for StatsRoleTable {
    fn default() -> Self {
        use StatsCounter::*;
        Self(BTreeMap::from([
            ("47".to_string(), RadioOperator),
            ("18".to_string(), Dispatch),
            ("1".to_string(), RadioOperator),
            ("80".to_string(), Dispatch),
            ("63".to_string(), Evaluation),
            ("PARTICIPANT".to_string(), RadioOperator),
        ]))
    }
}

impl StatsRoleTable {
    pub fn counter(&self, role_code: &str) -> Option<StatsCounter> {
        self.0.get(role_code).copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberCounters {
    pub dispatch: u32,
    pub evaluation: u32,
    pub radio_operator: u32,
}

impl MemberCounters {
    pub fn bump(&mut self, counter: StatsCounter) {
        match counter {
            StatsCounter::Dispatch => self.dispatch += 1,
            StatsCounter::Evaluation => self.evaluation += 1,
            StatsCounter::RadioOperator => self.radio_operator += 1,
        }
    }
}

impl PegassClient {
    /// Per-member counters over every completed dispatch occurrence in
    /// `range`, keyed by member key.
    ///
    /// Any failed request aborts the whole export.
    pub async fn fetch_aggregated_stats(
        &self,
        range: DateRange,
    ) -> Result<BTreeMap<String, MemberCounters>> {
        let settings = &self.config().stats;
        let api = self.api();
        let occurrences = api
            .occurrences(&OccurrenceSearch {
                start: Some(range.start()),
                end: Some(range.end()),
                activity_type_id: Some(settings.activity_type_id),
                structure_id: Some(settings.structure_id),
                status: Some("COMPLETE"),
                size: settings.page_size,
                ..Default::default()
            })
            .await?;
        info!(count = occurrences.len(), "dispatch occurrences to tally");

        let mut counters: BTreeMap<String, MemberCounters> = BTreeMap::new();
        for occurrence in &occurrences {
            for registration in api.registrations(&occurrence.id).await? {
                let entry = counters
                    .entry(registration.utilisateur.id.clone())
                    .or_default();
                match settings.roles.counter(&registration.role) {
                    Some(counter) => entry.bump(counter),
                    None => warn!(
                        role = %registration.role,
                        occurrence = %occurrence.id,
                        "unsupported role in dispatch stats"
                    ),
                }
            }
        }
        Ok(counters)
    }
}
