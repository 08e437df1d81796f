//! Cookie-authenticated REST surface of the target application.
//!
//! [`RestApi`] is a cheap, cloneable handle over the active HTTP client.
//! Every method names its endpoint in the errors it returns.

pub mod payloads;

use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{PegassError, Result};
use crate::pagination::{self, Page};
use payloads::{
    ActivityPayload, ContactPayload, CurrentUserPayload, MemberPayload, MemberStatsPayload,
    OccurrencePayload, RegistrationPayload, RolePayload, StructureListPayload, TrainingPayload,
};

/// Path prefix of every REST endpoint.
const REST_PREFIX: &str = "crf/rest/";

/// Listing filters of the roster search.
#[derive(Debug, Clone)]
pub struct MemberSearch<'a> {
    /// `role`, `nomination` or `formation`.
    pub filter: &'static str,
    pub filter_value: &'a str,
    pub department: &'a str,
    pub per_page: u32,
}

/// Filters of the scheduled-occurrence search.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceSearch<'a> {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub action_id: Option<i64>,
    pub activity_type_id: Option<i64>,
    pub structure_id: Option<i64>,
    pub department: Option<&'a str>,
    pub status: Option<&'a str>,
    pub size: u32,
}

impl OccurrenceSearch<'_> {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("pageInfo", "true".to_string()), ("size", self.size.to_string())];
        if let Some(action) = self.action_id {
            query.push(("action", action.to_string()));
        }
        if let Some(start) = self.start {
            query.push(("debut", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end {
            query.push(("fin", end.format("%Y-%m-%d").to_string()));
        }
        if let Some(status) = self.status {
            query.push(("statut", status.to_string()));
        }
        if let Some(structure) = self.structure_id {
            query.push(("structure", structure.to_string()));
        }
        if let Some(kind) = self.activity_type_id {
            query.push(("typeActivite", kind.to_string()));
        }
        if let Some(department) = self.department {
            query.push(("zoneGeoId", department.to_string()));
            query.push(("zoneGeoType", "departement".to_string()));
        }
        query
    }
}

#[derive(Debug, Clone)]
pub struct RestApi {
    http: Client,
    base: Arc<Url>,
    max_pages: u32,
}

impl RestApi {
    pub(crate) fn new(http: Client, app_base: &Url, max_pages: u32) -> Result<Self> {
        let base = app_base
            .join(REST_PREFIX)
            .map_err(|e| PegassError::decode(app_base.as_str(), e))?;
        Ok(Self {
            http,
            base: Arc::new(base),
            max_pages,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| PegassError::decode(path, e))
    }

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path)?;
        debug!(endpoint = path, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| PegassError::transport(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PegassError::HttpStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PegassError::transport(path, e))?;
        serde_json::from_slice(&body).map_err(|e| PegassError::decode(path, e))
    }

    /// GET every page of a listing, appending `page=N` to `query`.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        pagination::fetch_all(path, self.max_pages, |index| {
            let mut paged = query.to_vec();
            paged.push(("page", index.to_string()));
            async move { self.get_json::<Page<T>>(path, &paged).await }
        })
        .await
    }

    pub async fn search_members(&self, search: &MemberSearch<'_>) -> Result<Vec<MemberPayload>> {
        let query = [
            ("pageInfo", "true".to_string()),
            ("perPage", search.per_page.to_string()),
            (search.filter, search.filter_value.to_string()),
            ("searchType", "benevoles".to_string()),
            ("withMoyensCom", "true".to_string()),
            ("zoneGeoId", search.department.to_string()),
            ("zoneGeoType", "departement".to_string()),
        ];
        self.get_all("utilisateur", &query).await
    }

    pub async fn member(&self, member_id: &str) -> Result<MemberPayload> {
        self.get_json(&format!("utilisateur/{member_id}"), &[]).await
    }

    pub async fn current_user(&self) -> Result<CurrentUserPayload> {
        self.get_json("gestiondesdroits", &[]).await
    }

    pub async fn contacts(&self, member_id: &str) -> Result<Vec<ContactPayload>> {
        self.get_json("moyencomutilisateur", &[("utilisateur", member_id.to_string())])
            .await
    }

    pub async fn trainings(&self, member_id: &str) -> Result<Vec<TrainingPayload>> {
        self.get_json("formationutilisateur", &[("utilisateur", member_id.to_string())])
            .await
    }

    pub async fn occurrences(&self, search: &OccurrenceSearch<'_>) -> Result<Vec<OccurrencePayload>> {
        self.get_all("seance", &search.query()).await
    }

    pub async fn registrations(&self, occurrence_id: &str) -> Result<Vec<RegistrationPayload>> {
        self.get_json(&format!("seance/{occurrence_id}/inscription"), &[])
            .await
    }

    pub async fn activity(&self, activity_id: &str) -> Result<ActivityPayload> {
        self.get_json(&format!("activite/{activity_id}"), &[]).await
    }

    pub async fn department_structures(&self, department: &str) -> Result<StructureListPayload> {
        self.get_json(&format!("zonegeo/departement/{department}"), &[])
            .await
    }

    pub async fn roles(&self) -> Result<Vec<RolePayload>> {
        self.get_json("roles", &[]).await
    }

    pub async fn member_stats(
        &self,
        member_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MemberStatsPayload> {
        let path = format!(
            "statistiques/benevole/{member_id}/{}/{}/quantite",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
        self.get_json(&path, &[]).await
    }
}
