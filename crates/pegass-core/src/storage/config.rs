//! TOML-based application configuration.
//!
//! Stores:
//! - Credentials for the identity provider (username, password, TOTP secret)
//! - Endpoint base URLs and SSO paths
//! - Paging, timeout and concurrency limits
//! - Digest tables: label precedence, role classification, external associations
//! - Stats export filters
//!
//! Configuration is stored at `~/.config/pegass/config.toml`.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::data_dir;
use crate::error::ConfigError;
use crate::model::ActivityKind;
use crate::stats::StatsRoleTable;
use crate::summary::{PrecedenceTable, RoleTable};

/// Identity provider credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Base32 TOTP shared secret.
    #[serde(default)]
    pub totp_secret: String,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("totp_secret", &"<redacted>")
            .finish()
    }
}

impl CredentialsConfig {
    pub fn ensure_complete(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("credentials.username", &self.username),
            ("credentials.password", &self.password),
            ("credentials.totp_secret", &self.totp_secret),
        ] {
            if value.is_empty() {
                return Err(ConfigError::MissingKey(key.to_string()));
            }
        }
        Ok(())
    }
}

/// Where the identity provider and target application live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_idp_base_url")]
    pub idp_base_url: String,
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    /// Identity provider page that trades a session token for a SAML form.
    #[serde(default = "default_sso_redeem_path")]
    pub sso_redeem_path: String,
    #[serde(default = "default_saml_consumer_path")]
    pub saml_consumer_path: String,
    /// Cheap authenticated endpoint used to probe the session.
    #[serde(default = "default_session_probe_path")]
    pub session_probe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Hard cap on page requests per listing.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Geo zone (department) roster searches are scoped to.
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default = "default_roster_page_size")]
    pub page_size: u32,
}

/// Activity digest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Top-level category of emergency-network activities.
    #[serde(default = "default_action_id")]
    pub action_id: i64,
    #[serde(default = "default_occurrence_page_size")]
    pub page_size: u32,
    /// IANA zone upstream naive timestamps are expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Registrant lookups in flight per activity.
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
    #[serde(default = "default_medical_dispatch_types")]
    pub medical_dispatch_types: Vec<i64>,
    #[serde(default = "default_fire_brigade_types")]
    pub fire_brigade_types: Vec<i64>,
    /// Activity type of the dispatch desk.
    #[serde(default = "default_dispatch_type")]
    pub dispatch_type: i64,
    #[serde(default = "default_structure_cache_capacity")]
    pub structure_cache_capacity: usize,
    #[serde(default)]
    pub precedence: PrecedenceTable,
    /// Member key of a responsible party -> partner association name.
    #[serde(default = "default_external_associations")]
    pub external_associations: BTreeMap<String, String>,
    #[serde(default)]
    pub roles: RoleTable,
}

/// Dispatch statistics export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_stats_structure_id")]
    pub structure_id: i64,
    #[serde(default = "default_dispatch_type")]
    pub activity_type_id: i64,
    #[serde(default = "default_occurrence_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub roles: StatsRoleTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Defaults to `auth-ticket.json` in the data directory.
    #[serde(default)]
    pub ticket_path: Option<PathBuf>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pegass/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_idp_base_url() -> String {
    "https://connect.croix-rouge.fr".into()
}
fn default_app_base_url() -> String {
    "https://pegass.croix-rouge.fr".into()
}
fn default_sso_redeem_path() -> String {
    "/home/croix-rouge_pegass_1/0oa2s6fw19Pp8eQzd417/aln2s6knvxzI5pG6x417".into()
}
fn default_saml_consumer_path() -> String {
    "/Shibboleth.sso/SAML2/POST".into()
}
fn default_session_probe_path() -> String {
    "/crf/rest/gestiondesdroits".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_pages() -> u32 {
    500
}
fn default_department() -> String {
    "92".into()
}
fn default_roster_page_size() -> u32 {
    11
}
fn default_action_id() -> i64 {
    65
}
fn default_occurrence_page_size() -> u32 {
    100
}
fn default_timezone() -> String {
    "Europe/Paris".into()
}
fn default_lookup_concurrency() -> usize {
    4
}
fn default_medical_dispatch_types() -> Vec<i64> {
    vec![10115, 10114]
}
fn default_fire_brigade_types() -> Vec<i64> {
    vec![10116]
}
fn default_dispatch_type() -> i64 {
    10114
}
fn default_structure_cache_capacity() -> usize {
    8
}
fn default_external_associations() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("01100009671G".to_string(), "PCPS".to_string()),
        ("01100009672H".to_string(), "Malte".to_string()),
        ("01100039741E".to_string(), "FFSS".to_string()),
    ])
}
fn default_stats_structure_id() -> i64 {
    97
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            idp_base_url: default_idp_base_url(),
            app_base_url: default_app_base_url(),
            sso_redeem_path: default_sso_redeem_path(),
            saml_consumer_path: default_saml_consumer_path(),
            session_probe_path: default_session_probe_path(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            department: default_department(),
            page_size: default_roster_page_size(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            action_id: default_action_id(),
            page_size: default_occurrence_page_size(),
            timezone: default_timezone(),
            lookup_concurrency: default_lookup_concurrency(),
            medical_dispatch_types: default_medical_dispatch_types(),
            fire_brigade_types: default_fire_brigade_types(),
            dispatch_type: default_dispatch_type(),
            structure_cache_capacity: default_structure_cache_capacity(),
            precedence: PrecedenceTable::default(),
            external_associations: default_external_associations(),
            roles: RoleTable::default(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            structure_id: default_stats_structure_id(),
            activity_type_id: default_dispatch_type(),
            page_size: default_occurrence_page_size(),
            roles: StatsRoleTable::default(),
        }
    }
}

impl EndpointsConfig {
    pub fn idp_base(&self) -> Result<Url, ConfigError> {
        parse_url("endpoints.idp_base_url", &self.idp_base_url)
    }

    pub fn app_base(&self) -> Result<Url, ConfigError> {
        parse_url("endpoints.app_base_url", &self.app_base_url)
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl SummaryConfig {
    /// Activity types a digest of `kind` covers.
    pub fn type_codes(&self, kind: ActivityKind) -> &[i64] {
        match kind {
            ActivityKind::MedicalDispatch => &self.medical_dispatch_types,
            ActivityKind::FireBrigade => &self.fire_brigade_types,
        }
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "summary.timezone".to_string(),
                message: e.to_string(),
            })
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

impl Config {
    /// Default location of `config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/pegass"),
                message: e.to_string(),
            })
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Session ticket location, falling back to the data directory.
    pub fn ticket_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.session.ticket_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::path()?.with_file_name("auth-ticket.json")),
        }
    }
}
