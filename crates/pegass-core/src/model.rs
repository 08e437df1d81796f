//! Domain types, built from wire payloads at ingestion.
//!
//! Upstream timestamps are naive local times. They are localized here into
//! `DateTime<Tz>` once, and nothing downstream ever handles a naive value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::payloads::{
    ActivityPayload, ContactPayload, MemberPayload, RegistrationPayload, RolePayload,
    TrainingPayload,
};
use crate::error::ValidationError;

/// Contact method id of a member's mobile phone.
pub const MOBILE_PHONE: &str = "POR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMethod {
    /// Upstream method id (`POR` mobile, `MAIL`, ...).
    pub kind: String,
    pub value: String,
}

impl From<ContactPayload> for ContactMethod {
    fn from(p: ContactPayload) -> Self {
        Self {
            kind: p.moyen_com_id,
            value: p.libelle,
        }
    }
}

/// First mobile phone among contact methods, if any.
pub fn mobile_phone(contacts: &[ContactMethod]) -> Option<&str> {
    contacts
        .iter()
        .find(|c| c.kind == MOBILE_PHONE && !c.value.trim().is_empty())
        .map(|c| c.value.as_str())
}

/// A member of the roster, keyed by its member key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub structure: Option<StructureRef>,
    pub contacts: Vec<ContactMethod>,
    pub minor: bool,
    pub active: bool,
}

impl RosterEntry {
    /// "First Last", trimmed.
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn mobile_phone(&self) -> Option<&str> {
        mobile_phone(&self.contacts)
    }
}

impl From<MemberPayload> for RosterEntry {
    fn from(p: MemberPayload) -> Self {
        Self {
            id: p.id,
            first_name: p.prenom,
            last_name: p.nom,
            structure: p
                .structure
                .filter(|s| s.id != 0)
                .map(|s| StructureRef {
                    id: s.id,
                    name: s.libelle,
                }),
            contacts: p.coordonnees.into_iter().map(ContactMethod::from).collect(),
            minor: p.mineur,
            active: p.actif,
        }
    }
}

/// Four-way status shown in front of each occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceStatus {
    Complete,
    Incomplete,
    Cancelled,
    Unknown,
}

impl OccurrenceStatus {
    pub fn from_wire(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return OccurrenceStatus::Unknown;
        };
        match raw.trim().to_lowercase().as_str() {
            "complète" | "complete" => OccurrenceStatus::Complete,
            "incomplète" | "incomplete" => OccurrenceStatus::Incomplete,
            "annulée" | "annulee" | "annule" | "cancelled" => OccurrenceStatus::Cancelled,
            _ => OccurrenceStatus::Unknown,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            OccurrenceStatus::Complete => "✅",
            OccurrenceStatus::Incomplete => "❌",
            OccurrenceStatus::Cancelled => "🟡",
            OccurrenceStatus::Unknown => "❔",
        }
    }
}

/// One time-boxed instance of an activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledOccurrence {
    pub id: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub parent_activity_id: String,
    pub status: OccurrenceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub label: String,
    /// Upstream activity type id; selects the digest kind.
    pub type_code: i64,
    /// Top-level category ("action") the type belongs to.
    pub action_id: i64,
    /// Operational structure running the activity.
    pub structure_id: Option<i64>,
    pub responsible_id: Option<String>,
    /// Ordered by start time.
    pub occurrences: Vec<ScheduledOccurrence>,
    pub status: OccurrenceStatus,
}

impl Activity {
    /// Normalize an activity record. Fails on unreadable timestamps.
    pub fn from_payload(payload: ActivityPayload, tz: Tz) -> Result<Self, String> {
        let status = OccurrenceStatus::from_wire(payload.statut.as_deref());
        let mut occurrences = payload
            .seance_list
            .into_iter()
            .map(|seance| {
                let start = localize(seance.debut.as_deref(), tz)
                    .map_err(|e| format!("occurrence {} start: {e}", seance.id))?;
                let end = localize(seance.fin.as_deref(), tz)
                    .map_err(|e| format!("occurrence {} end: {e}", seance.id))?;
                Ok(ScheduledOccurrence {
                    status: match seance.statut.as_deref() {
                        Some(raw) => OccurrenceStatus::from_wire(Some(raw)),
                        None => status,
                    },
                    id: seance.id,
                    start,
                    end,
                    parent_activity_id: payload.id.clone(),
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        occurrences.sort_by(|a, b| a.start.cmp(&b.start));

        Ok(Self {
            id: payload.id,
            label: payload.libelle.trim().to_string(),
            type_code: payload.type_activite.id,
            action_id: payload.type_activite.action.id,
            structure_id: payload
                .structure_menant_activite
                .map(|s| s.id)
                .filter(|id| *id != 0),
            responsible_id: payload.responsable.map(|r| r.id),
            occurrences,
            status,
        })
    }

    pub fn earliest_start(&self) -> Option<DateTime<Tz>> {
        self.occurrences.iter().map(|o| o.start).min()
    }

    /// Keep only the listed occurrences, unless none of them belong here.
    pub fn retain_occurrences(&mut self, ids: &[String]) {
        if self.occurrences.iter().any(|o| ids.contains(&o.id)) {
            self.occurrences.retain(|o| ids.contains(&o.id));
        }
    }
}

/// A member signed up on an occurrence with a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub member_id: String,
    pub role_type: String,
    pub role_code: String,
}

impl From<RegistrationPayload> for Registration {
    fn from(p: RegistrationPayload) -> Self {
        Self {
            member_id: p.utilisateur.id,
            role_type: p.role_type,
            role_code: p.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRecord {
    pub code: String,
    /// Set on refresher sessions.
    pub refresher: bool,
}

impl From<TrainingPayload> for TrainingRecord {
    fn from(p: TrainingPayload) -> Self {
        Self {
            code: p.formation.code,
            refresher: p.formation.recyclage,
        }
    }
}

/// True when the history holds a PSE1/PSE2 entry that is not a refresher.
pub fn is_unrefreshed_first_responder(trainings: &[TrainingRecord]) -> bool {
    trainings
        .iter()
        .any(|t| (t.code == "PSE1" || t.code == "PSE2") && !t.refresher)
}

/// Catalogue family of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleType {
    /// `COMP`
    Skill,
    /// `NOMI`
    Nomination,
    /// `FORM`
    Training,
    Other(String),
}

impl RoleType {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "COMP" => RoleType::Skill,
            "NOMI" => RoleType::Nomination,
            "FORM" => RoleType::Training,
            other => RoleType::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            RoleType::Skill => "COMP",
            RoleType::Nomination => "NOMI",
            RoleType::Training => "FORM",
            RoleType::Other(raw) => raw,
        }
    }

    /// Roster search filter carrying a role of this family.
    pub fn search_param(&self) -> Option<&'static str> {
        match self {
            RoleType::Skill => Some("role"),
            RoleType::Nomination => Some("nomination"),
            RoleType::Training => Some("formation"),
            RoleType::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub label: String,
    pub role_type: RoleType,
}

impl Role {
    pub fn new(id: impl Into<String>, label: impl Into<String>, role_type: RoleType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            role_type,
        }
    }
}

impl From<RolePayload> for Role {
    fn from(p: RolePayload) -> Self {
        Self {
            role_type: RoleType::from_wire(&p.role_type),
            id: p.id,
            label: p.libelle,
        }
    }
}

/// Which network a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// Medical emergency network and its dispatch desk.
    MedicalDispatch,
    FireBrigade,
}

impl ActivityKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ActivityKind::MedicalDispatch => "SAMU",
            ActivityKind::FireBrigade => "BSPP",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityKind::MedicalDispatch => "medical-dispatch",
            ActivityKind::FireBrigade => "fire-brigade",
        })
    }
}

impl FromStr for ActivityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "medical-dispatch" | "samu" | "psr" => Ok(ActivityKind::MedicalDispatch),
            "fire-brigade" | "bspp" => Ok(ActivityKind::FireBrigade),
            other => Err(ValidationError::InvalidValue {
                field: "kind".to_string(),
                message: format!("unknown activity kind '{other}'"),
            }),
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Localize an upstream timestamp.
///
/// Values carrying an offset are converted; naive values are read as local
/// time in `tz`. On a DST fold the earlier instant wins.
pub fn localize(raw: Option<&str>, tz: Tz) -> Result<DateTime<Tz>, String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or("missing timestamp")?;

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&tz));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| format!("unreadable timestamp '{raw}': {e}"))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("'{raw}' does not exist in {tz}"))
}
