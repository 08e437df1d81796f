//! Daily digest of emergency-network activities.
//!
//! [`PegassClient::summarize`] lists the day's occurrences, resolves their
//! activities, keeps the ones of the requested kind, orders them, then
//! annotates each with what its registrants hold. Only the occurrence
//! listing is fatal; every per-activity or per-registrant lookup degrades.

mod classify;
mod ordering;
mod render;
mod tally;

pub use classify::{RoleClassification, RoleRule, RoleTable};
pub use ordering::PrecedenceTable;
pub use render::{render, RenderedActivity, NO_ACTIVITY};
pub use tally::{RegistrantFacts, Tally, UNKNOWN_PHONE};

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::api::{OccurrenceSearch, RestApi};
use crate::client::{PegassClient, StructureNames};
use crate::error::Result;
use crate::model::{
    is_unrefreshed_first_responder, mobile_phone, Activity, ActivityKind, ContactMethod,
    Registration, RosterEntry, TrainingRecord,
};

impl PegassClient {
    /// Text digest of `day` for one kind of activity.
    ///
    /// With `suppress_details` only headers and time ranges are printed and
    /// no registrant is looked up.
    pub async fn summarize(
        &self,
        day: NaiveDate,
        kind: ActivityKind,
        suppress_details: bool,
    ) -> Result<String> {
        let settings = &self.config().summary;
        let activities = self.activities_on(day, kind).await?;
        info!(%day, %kind, count = activities.len(), "activities to summarize");

        let needs_structures = activities
            .iter()
            .any(|a| a.type_code != settings.dispatch_type && self.partner_of(a).is_none());
        let structures = if needs_structures {
            self.structure_names_or_warn().await
        } else {
            None
        };

        let mut rendered = Vec::with_capacity(activities.len());
        for activity in &activities {
            let dispatch = activity.type_code == settings.dispatch_type;
            let partner = self.partner_of(activity);

            let header_info = match partner {
                Some(name) => Some(name.to_string()),
                None if !dispatch => activity
                    .structure_id
                    .and_then(|id| structures.as_ref()?.get(&id).cloned()),
                None => None,
            };

            let annotation = if partner.is_some() || suppress_details {
                String::new()
            } else {
                match self.registrant_tally(activity).await {
                    Ok(tally) => tally.annotation(dispatch),
                    Err(err) => {
                        warn!(activity = %activity.id, label = %activity.label, error = %err,
                            "skipping activity, registrants unavailable");
                        continue;
                    }
                }
            };

            rendered.push(RenderedActivity {
                activity,
                header_info,
                annotation,
            });
        }

        Ok(render(&rendered))
    }

    /// Activities of `kind` with an occurrence on `day`, in report order.
    ///
    /// Only the listed occurrences are kept on each activity.
    pub async fn activities_on(&self, day: NaiveDate, kind: ActivityKind) -> Result<Vec<Activity>> {
        let settings = &self.config().summary;
        let api = self.api();
        let occurrences = api
            .occurrences(&OccurrenceSearch {
                start: Some(day),
                end: Some(day),
                action_id: Some(settings.action_id),
                department: Some(&self.config().roster.department),
                size: settings.page_size,
                ..Default::default()
            })
            .await?;

        // activity id -> occurrence ids, in listing order
        let mut order: Vec<String> = Vec::new();
        let mut listed: HashMap<String, Vec<String>> = HashMap::new();
        for occurrence in occurrences {
            let Some(parent) = occurrence.activite else {
                warn!(occurrence = %occurrence.id, "occurrence without activity");
                continue;
            };
            listed
                .entry(parent.id.clone())
                .or_insert_with(|| {
                    order.push(parent.id.clone());
                    Vec::new()
                })
                .push(occurrence.id);
        }

        let wanted = settings.type_codes(kind);
        let mut activities = Vec::with_capacity(order.len());
        for activity_id in order {
            let payload = match api.activity(&activity_id).await {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(activity = %activity_id, error = %err, "activity lookup failed");
                    continue;
                }
            };
            let mut activity = match Activity::from_payload(payload, self.tz()) {
                Ok(activity) => activity,
                Err(message) => {
                    warn!(activity = %activity_id, %message, "unreadable activity");
                    continue;
                }
            };
            if let Some(ids) = listed.get(&activity_id) {
                activity.retain_occurrences(ids);
            }

            if activity.structure_id.is_none()
                || activity.action_id != settings.action_id
                || !wanted.contains(&activity.type_code)
            {
                debug!(activity = %activity.id, type_code = activity.type_code, "filtered out");
                continue;
            }
            activities.push(activity);
        }

        settings.precedence.sort(&mut activities);
        Ok(activities)
    }

    fn partner_of(&self, activity: &Activity) -> Option<&str> {
        let id = activity.responsible_id.as_ref()?;
        self.config()
            .summary
            .external_associations
            .get(id)
            .map(String::as_str)
    }

    async fn structure_names_or_warn(&self) -> Option<StructureNames> {
        let department = &self.config().roster.department;
        match self.structure_names(department).await {
            Ok(names) => Some(names),
            Err(err) => {
                warn!(department = %department, error = %err, "structure names unavailable");
                None
            }
        }
    }

    /// Registrant counts of an activity, from its first occurrence.
    pub async fn registrant_tally(&self, activity: &Activity) -> Result<Tally> {
        let Some(first) = activity.occurrences.first() else {
            return Ok(Tally::default());
        };
        let api = self.api();
        let registrations: Vec<Registration> = api
            .registrations(&first.id)
            .await?
            .into_iter()
            .map(Registration::from)
            .collect();

        let facts = self.lookup_registrants(&api, activity, registrations).await;
        Ok(Tally::from_facts(&facts))
    }

    /// Look registrants up through a bounded pool; results keep
    /// registration order.
    async fn lookup_registrants(
        &self,
        api: &RestApi,
        activity: &Activity,
        registrations: Vec<Registration>,
    ) -> Vec<RegistrantFacts> {
        let settings = &self.config().summary;
        let permits = Arc::new(Semaphore::new(settings.lookup_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, registration) in registrations.into_iter().enumerate() {
            let classification = settings
                .roles
                .lookup(&registration.role_type, &registration.role_code)
                .unwrap_or_else(|gap| {
                    warn!(activity = %activity.id, label = %activity.label,
                        member = %registration.member_id, "{gap}");
                    RoleClassification::Unknown
                });
            let association = settings
                .external_associations
                .get(&registration.member_id)
                .cloned();
            let api = api.clone();
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let facts =
                    lookup_registrant(&api, registration.member_id, classification, association)
                        .await;
                (index, facts)
            });
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(err) => warn!(activity = %activity.id, error = %err, "registrant lookup aborted"),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, facts)| facts).collect()
    }
}

async fn lookup_registrant(
    api: &RestApi,
    member_id: String,
    classification: RoleClassification,
    association: Option<String>,
) -> RegistrantFacts {
    let member = match api.member(&member_id).await {
        Ok(payload) => Some(RosterEntry::from(payload)),
        Err(err) => {
            warn!(member = %member_id, error = %err, "member lookup failed");
            None
        }
    };

    let phone = if classification == RoleClassification::Chief {
        match api.contacts(&member_id).await {
            Ok(contacts) => {
                let contacts: Vec<ContactMethod> =
                    contacts.into_iter().map(ContactMethod::from).collect();
                mobile_phone(&contacts).map(str::to_string)
            }
            Err(err) => {
                warn!(member = %member_id, error = %err, "phone lookup failed");
                None
            }
        }
    } else {
        None
    };

    let unrefreshed_first_responder = if classification == RoleClassification::Trainee {
        match api.trainings(&member_id).await {
            Ok(trainings) => {
                let trainings: Vec<TrainingRecord> =
                    trainings.into_iter().map(TrainingRecord::from).collect();
                is_unrefreshed_first_responder(&trainings)
            }
            Err(err) => {
                warn!(member = %member_id, error = %err, "training history lookup failed");
                false
            }
        }
    } else {
        false
    };

    RegistrantFacts {
        member_id,
        classification,
        member,
        phone,
        unrefreshed_first_responder,
        association,
    }
}
