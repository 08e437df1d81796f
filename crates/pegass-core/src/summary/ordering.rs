//! Report ordering of activities.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::Activity;

/// Rank of each activity label in the digest. Lower ranks print first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceTable {
    #[serde(default = "default_ranks")]
    pub ranks: BTreeMap<String, u32>,
    /// Rank of labels missing from `ranks`.
    #[serde(default = "default_unranked")]
    pub unranked: u32,
}

fn default_ranks() -> BTreeMap<String, u32> {
    // Field posts are unranked and print first; dispatch closes the report.
    BTreeMap::from([("REGULATION".to_string(), 100)])
}

fn default_unranked() -> u32 {
    50
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self {
            ranks: default_ranks(),
            unranked: default_unranked(),
        }
    }
}

impl PrecedenceTable {
    pub fn rank(&self, label: &str) -> u32 {
        self.ranks.get(label).copied().unwrap_or(self.unranked)
    }

    /// Total order: rank, then label so one label stays one section, then
    /// earliest start (no occurrences first) and id.
    pub fn compare(&self, a: &Activity, b: &Activity) -> Ordering {
        self.rank(&a.label)
            .cmp(&self.rank(&b.label))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.earliest_start().cmp(&b.earliest_start()))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, activities: &mut [Activity]) {
        activities.sort_by(|a, b| self.compare(a, b));
    }
}
