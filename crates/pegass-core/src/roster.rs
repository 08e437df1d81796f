//! Roster queries: roles, members, contacts, trainings, structures.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::payloads::MemberStatsPayload;
use crate::api::MemberSearch;
use crate::client::{PegassClient, StructureNames};
use crate::error::{PegassError, Result, ValidationError};
use crate::model::{ContactMethod, DateRange, Role, RoleType, RosterEntry, TrainingRecord};

/// Skill id of the dispatcher role.
pub const DISPATCHER_ROLE_ID: &str = "18";

const STRUCTURE_PREFIXES: [&str; 2] = ["UNITE LOCALE DE ", "UNITE LOCALE D'"];

/// Activity-group label and activity label of dispatch shifts in the
/// per-member statistics.
const EMERGENCY_GROUP: &str = "Urgence et Secourisme";
const DISPATCH_ACTIVITY: &str = "Régulation";

/// Short display name of a local unit.
pub fn short_structure_name(name: &str) -> String {
    STRUCTURE_PREFIXES
        .iter()
        .fold(name.to_string(), |acc, prefix| acc.replace(prefix, ""))
}

/// Member statistics, flattened to `(group, activity) -> count`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberStats {
    pub by_activity: BTreeMap<(String, String), i64>,
}

impl MemberStats {
    pub fn count(&self, group: &str, activity: &str) -> i64 {
        self.by_activity
            .get(&(group.to_string(), activity.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Dispatch shifts done over the period.
    pub fn dispatch_shifts(&self) -> i64 {
        self.count(EMERGENCY_GROUP, DISPATCH_ACTIVITY)
    }
}

impl From<MemberStatsPayload> for MemberStats {
    fn from(payload: MemberStatsPayload) -> Self {
        let mut by_activity = BTreeMap::new();
        for group in payload.statistiques {
            let group_label = group.statistiques_groupe_action.label;
            for activity in group.statistiques_activites {
                *by_activity
                    .entry((group_label.clone(), activity.label))
                    .or_insert(0) += activity.nombre;
            }
        }
        Self { by_activity }
    }
}

impl PegassClient {
    /// Catalogue role whose label is exactly `name`.
    pub async fn find_role_by_name(&self, name: &str) -> Result<Role> {
        let roles = self.api().roles().await?;
        roles
            .into_iter()
            .find(|role| role.libelle == name)
            .map(Role::from)
            .ok_or_else(|| PegassError::NotFound {
                what: "role",
                key: name.to_string(),
            })
    }

    /// Every member of the configured department holding `role`.
    pub async fn fetch_users_for_role(&self, role: &Role) -> Result<Vec<RosterEntry>> {
        let filter = role
            .role_type
            .search_param()
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "role_type".to_string(),
                message: format!("unsupported role type '{}'", role.role_type.as_wire()),
            })?;
        let roster = &self.config().roster;
        let search = MemberSearch {
            filter,
            filter_value: &role.id,
            department: &roster.department,
            per_page: roster.page_size,
        };
        let members = self.api().search_members(&search).await?;
        info!(role = %role.label, count = members.len(), "roster search done");
        Ok(members.into_iter().map(RosterEntry::from).collect())
    }

    /// Members holding the dispatcher skill.
    pub async fn fetch_dispatchers(&self) -> Result<Vec<RosterEntry>> {
        let role = Role::new(DISPATCHER_ROLE_ID, "Régulateur", RoleType::Skill);
        self.fetch_users_for_role(&role).await
    }

    pub async fn member(&self, member_id: &str) -> Result<RosterEntry> {
        Ok(self.api().member(member_id).await?.into())
    }

    /// The logged-in member.
    pub async fn current_user(&self) -> Result<RosterEntry> {
        Ok(self.api().current_user().await?.utilisateur.into())
    }

    pub async fn contacts(&self, member_id: &str) -> Result<Vec<ContactMethod>> {
        let contacts = self.api().contacts(member_id).await?;
        Ok(contacts.into_iter().map(ContactMethod::from).collect())
    }

    /// Mobile phone number, if the member has one.
    pub async fn mobile_phone(&self, member_id: &str) -> Result<Option<String>> {
        let contacts = self.contacts(member_id).await?;
        Ok(crate::model::mobile_phone(&contacts).map(str::to_string))
    }

    pub async fn trainings(&self, member_id: &str) -> Result<Vec<TrainingRecord>> {
        let trainings = self.api().trainings(member_id).await?;
        Ok(trainings.into_iter().map(TrainingRecord::from).collect())
    }

    /// Local units of a department by id, with short names. Memoized until
    /// the next re-authentication.
    pub async fn structure_names(&self, department: &str) -> Result<StructureNames> {
        if let Some(names) = self.structure_cache().get(department) {
            debug!(department, "structure names from cache");
            return Ok(names);
        }

        let list = self.api().department_structures(department).await?;
        let names: StructureNames = Arc::new(
            list.structures_filles
                .into_iter()
                .map(|s| (s.id, short_structure_name(&s.libelle)))
                .collect(),
        );
        self.structure_cache().insert(department, Arc::clone(&names));
        Ok(names)
    }

    pub async fn member_stats(&self, member_id: &str, range: DateRange) -> Result<MemberStats> {
        Ok(self
            .api()
            .member_stats(member_id, range.start(), range.end())
            .await?
            .into())
    }

    /// Dispatch shifts per dispatcher over a period, in roster order.
    pub async fn dispatcher_shift_counts(
        &self,
        range: DateRange,
    ) -> Result<Vec<(RosterEntry, i64)>> {
        let dispatchers = self.fetch_dispatchers().await?;
        let mut counts = Vec::with_capacity(dispatchers.len());
        for dispatcher in dispatchers {
            let stats = self.member_stats(&dispatcher.id, range).await?;
            counts.push((dispatcher, stats.dispatch_shifts()));
        }
        Ok(counts)
    }
}

/// First and last day of a calendar year.
pub fn year_range(year: i32) -> Result<DateRange> {
    let bound = |month, day| {
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| ValidationError::InvalidValue {
            field: "year".to_string(),
            message: format!("{year} is out of range"),
        })
    };
    Ok(DateRange::new(bound(1, 1)?, bound(12, 31)?)?)
}
