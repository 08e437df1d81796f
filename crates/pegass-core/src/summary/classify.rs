//! Registrant role classification.
//!
//! A registration carries a `(roleType, roleCode)` pair as the target API
//! reports it (`COMP` skills, `NOMI` nominations, `FORM` trainings, plus the
//! bare `PARTICIPANT` code). [`RoleTable`] maps each pair to exactly one
//! [`RoleClassification`]; pairs without a rule land on `Unknown`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ClassificationGap;

/// What a registrant does on an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleClassification {
    Chief,
    Driver,
    Pse2,
    Pse1,
    Trainee,
    Dispatcher,
    DispatcherTrainer,
    RadioOperator,
    Unknown,
}

impl RoleClassification {
    pub const ALL: [RoleClassification; 9] = [
        RoleClassification::Chief,
        RoleClassification::Driver,
        RoleClassification::Pse2,
        RoleClassification::Pse1,
        RoleClassification::Trainee,
        RoleClassification::Dispatcher,
        RoleClassification::DispatcherTrainer,
        RoleClassification::RadioOperator,
        RoleClassification::Unknown,
    ];

    /// Counts toward the dispatcher total on a dispatch activity.
    pub fn is_dispatcher(self) -> bool {
        matches!(
            self,
            RoleClassification::Dispatcher | RoleClassification::DispatcherTrainer
        )
    }
}

/// One row of the classification table.
///
/// `role_type = None` matches any type; exact rows win over wildcard rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    #[serde(default)]
    pub role_type: Option<String>,
    pub role_code: String,
    pub classification: RoleClassification,
}

impl RoleRule {
    pub fn exact(role_type: &str, role_code: &str, classification: RoleClassification) -> Self {
        Self {
            role_type: Some(role_type.to_string()),
            role_code: role_code.to_string(),
            classification,
        }
    }

    pub fn any_type(role_code: &str, classification: RoleClassification) -> Self {
        Self {
            role_type: None,
            role_code: role_code.to_string(),
            classification,
        }
    }
}

/// Declarative `(roleType, roleCode) -> classification` lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<RoleRule>", into = "Vec<RoleRule>")]
pub struct RoleTable {
    rules: Vec<RoleRule>,
    exact: HashMap<(String, String), RoleClassification>,
    wildcard: HashMap<String, RoleClassification>,
}

impl RoleTable {
    /// Build from rules. Later rows override earlier rows for the same key.
    pub fn new(rules: Vec<RoleRule>) -> Self {
        let mut exact = HashMap::new();
        let mut wildcard = HashMap::new();
        for rule in &rules {
            match &rule.role_type {
                Some(role_type) => {
                    exact.insert(
                        (role_type.clone(), rule.role_code.clone()),
                        rule.classification,
                    );
                }
                None => {
                    wildcard.insert(rule.role_code.clone(), rule.classification);
                }
            }
        }
        Self {
            rules,
            exact,
            wildcard,
        }
    }

    pub fn rules(&self) -> &[RoleRule] {
        &self.rules
    }

    /// Classify a pair. Returns the gap when no row matches.
    pub fn lookup(&self, role_type: &str, role_code: &str) -> Result<RoleClassification, ClassificationGap> {
        self.exact
            .get(&(role_type.to_string(), role_code.to_string()))
            .or_else(|| self.wildcard.get(role_code))
            .copied()
            .ok_or_else(|| ClassificationGap {
                role_type: role_type.to_string(),
                role_code: role_code.to_string(),
            })
    }

    /// Classify a pair, falling back to `Unknown`.
    pub fn classify(&self, role_type: &str, role_code: &str) -> RoleClassification {
        self.lookup(role_type, role_code)
            .unwrap_or(RoleClassification::Unknown)
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        use RoleClassification::*;
        Self::new(vec![
            // duty chief, network and fire-brigade posts
            RoleRule::exact("NOMI", "254", Chief),
            RoleRule::exact("NOMI", "255", Chief),
            RoleRule::exact("COMP", "10", Driver),
            RoleRule::exact("FORM", "167", Pse2),
            RoleRule::exact("FORM", "166", Pse1),
            RoleRule::any_type("PARTICIPANT", Trainee),
            RoleRule::exact("COMP", "18", Dispatcher),
            RoleRule::exact("COMP", "80", Dispatcher),
            // dispatcher evaluator
            RoleRule::exact("COMP", "63", DispatcherTrainer),
            RoleRule::exact("FORM", "47", RadioOperator),
        ])
    }
}

impl From<Vec<RoleRule>> for RoleTable {
    fn from(rules: Vec<RoleRule>) -> Self {
        Self::new(rules)
    }
}

impl From<RoleTable> for Vec<RoleRule> {
    fn from(table: RoleTable) -> Self {
        table.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dispatcher_skill_maps_to_dispatcher() {
        let table = RoleTable::default();
        assert_eq!(table.classify("COMP", "18"), RoleClassification::Dispatcher);
    }

    #[test]
    fn pse2_training_maps_to_pse2() {
        let table = RoleTable::default();
        assert_eq!(table.classify("FORM", "167"), RoleClassification::Pse2);
    }

    #[test]
    fn participant_matches_any_role_type() {
        let table = RoleTable::default();
        assert_eq!(table.classify("", "PARTICIPANT"), RoleClassification::Trainee);
        assert_eq!(table.classify("COMP", "PARTICIPANT"), RoleClassification::Trainee);
    }

    #[test]
    fn type_matters_for_exact_rows() {
        let table = RoleTable::default();
        // 18 is only a dispatcher code under COMP
        assert_eq!(table.classify("FORM", "18"), RoleClassification::Unknown);
    }

    #[test]
    fn unmapped_pair_reports_gap() {
        let table = RoleTable::default();
        let gap = table.lookup("NOMI", "999").unwrap_err();
        assert_eq!(gap.role_type, "NOMI");
        assert_eq!(gap.role_code, "999");
    }

    #[test]
    fn exact_row_beats_wildcard() {
        let table = RoleTable::new(vec![
            RoleRule::any_type("1", RoleClassification::Trainee),
            RoleRule::exact("COMP", "1", RoleClassification::RadioOperator),
        ]);
        assert_eq!(table.classify("COMP", "1"), RoleClassification::RadioOperator);
        assert_eq!(table.classify("FORM", "1"), RoleClassification::Trainee);
    }

    #[test]
    fn table_deserializes_from_toml_rows() {
        #[derive(Deserialize)]
        struct Wrapper {
            roles: RoleTable,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [[roles]]
            role_type = "COMP"
            role_code = "42"
            classification = "radio-operator"

            [[roles]]
            role_code = "PARTICIPANT"
            classification = "trainee"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.roles.classify("COMP", "42"), RoleClassification::RadioOperator);
        assert_eq!(parsed.roles.classify("X", "PARTICIPANT"), RoleClassification::Trainee);
        assert_eq!(parsed.roles.rules().len(), 2);
    }

    proptest! {
        #[test]
        fn every_pair_maps_to_exactly_one_classification(
            role_type in "[A-Z]{0,5}",
            role_code in "[0-9A-Z]{0,6}",
        ) {
            let table = RoleTable::default();
            let classified = table.classify(&role_type, &role_code);
            match table.lookup(&role_type, &role_code) {
                Ok(found) => prop_assert_eq!(found, classified),
                Err(_) => prop_assert_eq!(classified, RoleClassification::Unknown),
            }
            prop_assert!(RoleClassification::ALL.contains(&classified));
        }
    }
}
