//! Registrant counts of one activity and the annotation built from them.

use std::fmt::Write as _;

use super::classify::RoleClassification;
use crate::model::RosterEntry;

/// Shown when a chief's phone number cannot be read.
pub const UNKNOWN_PHONE: &str = "(unknown)";

/// What the lookups learned about one registrant.
#[derive(Debug, Clone)]
pub struct RegistrantFacts {
    pub member_id: String,
    pub classification: RoleClassification,
    /// `None` when the member detail lookup failed.
    pub member: Option<RosterEntry>,
    /// Only looked up for chiefs; `None` when absent or the lookup failed.
    pub phone: Option<String>,
    /// Only checked for trainees.
    pub unrefreshed_first_responder: bool,
    /// Partner association the member belongs to, if any.
    pub association: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub participants: usize,
    pub minors: usize,
    pub chiefs: usize,
    pub drivers: usize,
    pub pse2: usize,
    pub pse1: usize,
    pub trainees: usize,
    /// Dispatchers, evaluators included.
    pub dispatchers: usize,
    pub dispatcher_trainers: usize,
    pub radio_operators: usize,
    pub unknown: usize,
    pub unrefreshed_trainee: bool,
    /// "📞 First Last phone" of the first chief.
    pub chief_contact: Option<String>,
    /// Association running the dispatch desk.
    pub dispatch_association: Option<String>,
}

impl Tally {
    /// Fold registrants in registration order.
    pub fn from_facts<'a>(facts: impl IntoIterator<Item = &'a RegistrantFacts>) -> Self {
        let mut tally = Tally::default();
        for fact in facts {
            tally.add(fact);
        }
        tally
    }

    fn add(&mut self, fact: &RegistrantFacts) {
        self.participants += 1;
        if fact.member.as_ref().is_some_and(|m| m.minor) {
            self.minors += 1;
        }

        match fact.classification {
            RoleClassification::Chief => {
                self.chiefs += 1;
                if self.chief_contact.is_none() {
                    let name = fact
                        .member
                        .as_ref()
                        .map(RosterEntry::name)
                        .unwrap_or_else(|| fact.member_id.clone());
                    let phone = fact.phone.as_deref().unwrap_or(UNKNOWN_PHONE);
                    self.chief_contact = Some(format!("📞 {name} {phone}"));
                }
            }
            RoleClassification::Driver => self.drivers += 1,
            RoleClassification::Pse2 => self.pse2 += 1,
            RoleClassification::Pse1 => self.pse1 += 1,
            RoleClassification::Trainee => {
                self.trainees += 1;
                self.unrefreshed_trainee |= fact.unrefreshed_first_responder;
            }
            RoleClassification::Dispatcher | RoleClassification::DispatcherTrainer => {
                self.dispatchers += 1;
                if fact.classification == RoleClassification::DispatcherTrainer {
                    self.dispatcher_trainers += 1;
                }
                // first partner association wins over CRF
                if matches!(self.dispatch_association.as_deref(), None | Some("CRF")) {
                    let association = fact.association.as_deref().unwrap_or("CRF");
                    self.dispatch_association = Some(association.to_string());
                }
            }
            RoleClassification::RadioOperator => self.radio_operators += 1,
            RoleClassification::Unknown => self.unknown += 1,
        }
    }

    /// Annotation text following an activity's first time range.
    pub fn annotation(&self, dispatch: bool) -> String {
        let mut out = String::new();
        if self.participants == 0 {
            out.push_str("[0 PAX]");
            return out;
        }

        let _ = write!(out, "[{} PAX]", self.participants);
        if dispatch {
            if let Some(association) = &self.dispatch_association {
                let _ = write!(out, "[{association}]");
            }
            let _ = write!(
                out,
                "\n\t\t{} ARS, {} OPR, {} Stagiaire",
                self.dispatchers, self.radio_operators, self.trainees
            );
            if self.dispatcher_trainers > 0 {
                out.push_str("\n\t\tℹ️ Evaluation in progress");
            }
        }
        if self.minors > 0 {
            let _ = write!(out, "\n\t\t⚠️ {} 🔞", self.minors);
        }
        if let Some(contact) = &self.chief_contact {
            let _ = write!(out, "\n\t\t{contact}");
        }
        if !dispatch {
            if self.pse1 > 1 {
                let _ = write!(out, "\n\t\t⚠️ {} PSE1 (max 1)", self.pse1);
            }
            if self.pse2 == 0 {
                out.push_str("\n\t\t⚠️ 0 PSE2");
            }
            if self.unrefreshed_trainee {
                out.push_str("\n\t\t⚠️ Unrefreshed PSE observer");
            }
        }
        out
    }
}
