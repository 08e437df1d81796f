//! Wire shapes of the identity provider and target REST API.
//!
//! Field names follow the upstream JSON (French for the target API).
//! Anything optional upstream is `#[serde(default)]` so a sparse record
//! still decodes, and target API scalars also read `null` as their default.
//! Domain conversion lives in [`crate::model`].

use serde::{Deserialize, Deserializer, Serialize};

/// Upstream sends `null` for missing values as often as it omits them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Identity provider
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub options: PasswordAuthOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuthOptions {
    pub warn_before_password_expired: bool,
    pub multi_optional_factor_enroll: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAuthResponse {
    #[serde(default)]
    pub state_token: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "_embedded")]
    pub embedded: EmbeddedFactors,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmbeddedFactors {
    #[serde(default)]
    pub factors: Vec<FactorPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorPayload {
    pub id: String,
    #[serde(default)]
    pub factor_type: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub vendor_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaVerifyRequest<'a> {
    pub pass_code: &'a str,
    pub state_token: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaVerifyResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Target REST API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructurePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub libelle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub moyen_com_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub libelle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPayload {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prenom: String,
    #[serde(default)]
    pub structure: Option<StructurePayload>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coordonnees: Vec<ContactPayload>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actif: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mineur: bool,
}

/// `gestiondesdroits` answer: the logged-in member.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserPayload {
    pub utilisateur: MemberPayload,
}

/// Item of the `seance` search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrencePayload {
    pub id: String,
    #[serde(default)]
    pub activite: Option<ActivityRefPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRefPayload {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTypePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub libelle: String,
    #[serde(default)]
    pub action: IdRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySeancePayload {
    pub id: String,
    #[serde(default)]
    pub debut: Option<String>,
    #[serde(default)]
    pub fin: Option<String>,
    #[serde(default)]
    pub statut: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub libelle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub type_activite: ActivityTypePayload,
    #[serde(default)]
    pub structure_menant_activite: Option<IdRef>,
    #[serde(default)]
    pub responsable: Option<MemberRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seance_list: Vec<ActivitySeancePayload>,
    #[serde(default)]
    pub statut: Option<String>,
}

/// Item of `seance/{id}/inscription`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub utilisateur: MemberRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub role_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingPayload {
    pub formation: FormationPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormationPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recyclage: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureListPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub structures_filles: Vec<StructurePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RolePayload {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub libelle: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub role_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatsPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub statistiques: Vec<StatGroupPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatGroupPayload {
    pub statistiques_groupe_action: StatPayload,
    #[serde(default, deserialize_with = "null_as_default")]
    pub statistiques_activites: Vec<StatPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nombre: i64,
}
