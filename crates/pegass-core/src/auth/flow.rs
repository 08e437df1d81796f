//! Password + TOTP + SAML handshake.
//!
//! ```text
//! Start -> PasswordSubmitted -> MfaPending -> MfaVerified -> SessionExchanged -> Done
//!   \___________________________ any step ___________________________/-> Failed
//! ```
//!
//! Each run owns a fresh cookie jar and yields the single session cookie the
//! target application set. Nothing is retried: the state token, the TOTP
//! code and the assertion are all single-use.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::saml::{extract_hidden_field, SAML_RESPONSE_FIELD};
use super::totp;
use crate::api::payloads::{
    FactorPayload, MfaVerifyRequest, MfaVerifyResponse, PasswordAuthOptions, PasswordAuthRequest,
    PasswordAuthResponse,
};
use crate::error::{AuthError, PegassError, Result};
use crate::storage::{CredentialsConfig, SessionTicket};

const MFA_REQUIRED: &str = "MFA_REQUIRED";
const TOTP_FACTOR: &str = "token:software:totp";

const PASSWORD_ENDPOINT: &str = "api/v1/authn";
const REDEEM_ENDPOINT: &str = "session redeem";
const CONSUMER_ENDPOINT: &str = "saml consumer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Start,
    PasswordSubmitted,
    MfaPending,
    MfaVerified,
    SessionExchanged,
    Done,
    Failed,
}

/// Where the handshake talks to.
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    pub idp_base: Url,
    pub app_base: Url,
    pub sso_redeem_path: String,
    pub saml_consumer_path: String,
}

impl AuthEndpoints {
    fn idp(&self, path: &str) -> Result<Url> {
        self.idp_base
            .join(path)
            .map_err(|e| PegassError::decode(path, e))
    }

    fn app(&self, path: &str) -> Result<Url> {
        self.app_base
            .join(path)
            .map_err(|e| PegassError::decode(path, e))
    }
}

/// State token and factors handed back by the password step.
#[derive(Debug)]
struct AuthChallenge {
    state_token: String,
    factors: Vec<FactorPayload>,
}

impl AuthChallenge {
    fn totp_factor(&self) -> std::result::Result<&FactorPayload, AuthError> {
        self.factors
            .iter()
            .find(|f| f.factor_type == TOTP_FACTOR)
            .ok_or_else(|| AuthError::NoMfaFactor {
                offered: self.factors.iter().map(|f| f.factor_type.clone()).collect(),
            })
    }
}

/// One run of the handshake.
pub struct AuthFlow<'a> {
    endpoints: &'a AuthEndpoints,
    http: Client,
    jar: Arc<Jar>,
    state: AuthState,
}

impl<'a> AuthFlow<'a> {
    pub fn new(endpoints: &'a AuthEndpoints, timeout: Duration) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| PegassError::transport("http client", e))?;
        Ok(Self {
            endpoints,
            http,
            jar,
            state: AuthState::Start,
        })
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    fn advance(&mut self, next: AuthState) {
        debug!(from = ?self.state, to = ?next, "auth state");
        self.state = next;
    }

    /// Run every step and return the session ticket.
    pub async fn run(&mut self, credentials: &CredentialsConfig) -> Result<SessionTicket> {
        match self.steps(credentials).await {
            Ok(ticket) => {
                self.advance(AuthState::Done);
                info!(user = %credentials.username, "authenticated");
                Ok(ticket)
            }
            Err(err) => {
                warn!(step = ?self.state, error = %err, "authentication failed");
                self.advance(AuthState::Failed);
                Err(err)
            }
        }
    }

    async fn steps(&mut self, credentials: &CredentialsConfig) -> Result<SessionTicket> {
        let challenge = self
            .submit_password(&credentials.username, &credentials.password)
            .await?;
        self.advance(AuthState::PasswordSubmitted);

        let factor = challenge.totp_factor()?;
        self.advance(AuthState::MfaPending);

        let code = totp::current_code(&credentials.totp_secret)?;
        let session_token = self
            .verify_mfa(&factor.id, &challenge.state_token, &code)
            .await?;
        self.advance(AuthState::MfaVerified);

        let assertion = self.redeem_session(&session_token).await?;
        self.advance(AuthState::SessionExchanged);

        self.post_assertion(&assertion).await
    }

    async fn submit_password(&self, username: &str, password: &str) -> Result<AuthChallenge> {
        let body = PasswordAuthRequest {
            username,
            password,
            options: PasswordAuthOptions {
                warn_before_password_expired: true,
                multi_optional_factor_enroll: true,
            },
        };
        let response = self
            .http
            .post(self.endpoints.idp(PASSWORD_ENDPOINT)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| PegassError::transport(PASSWORD_ENDPOINT, e))?;

        let status = response.status();
        debug!(status = status.as_u16(), "password step answered");
        if !status.is_success() {
            return Err(PegassError::HttpStatus {
                endpoint: PASSWORD_ENDPOINT.to_string(),
                status: status.as_u16(),
            });
        }

        let payload: PasswordAuthResponse = response
            .json()
            .await
            .map_err(|e| PegassError::decode(PASSWORD_ENDPOINT, e))?;
        if payload.status != MFA_REQUIRED {
            return Err(AuthError::UnexpectedStatus {
                expected: MFA_REQUIRED.to_string(),
                actual: payload.status,
            }
            .into());
        }
        let state_token = payload
            .state_token
            .ok_or_else(|| PegassError::decode(PASSWORD_ENDPOINT, "missing stateToken"))?;

        Ok(AuthChallenge {
            state_token,
            factors: payload.embedded.factors,
        })
    }

    async fn verify_mfa(&self, factor_id: &str, state_token: &str, code: &str) -> Result<String> {
        let endpoint = format!("api/v1/authn/factors/{factor_id}/verify");
        let mut url = self.endpoints.idp(&endpoint)?;
        url.query_pairs_mut().append_pair("rememberDevice", "false");

        let response = self
            .http
            .post(url)
            .json(&MfaVerifyRequest {
                pass_code: code,
                state_token,
            })
            .send()
            .await
            .map_err(|e| PegassError::transport(endpoint.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::MfaRejected {
                status: format!("HTTP {}", status.as_u16()),
            }
            .into());
        }
        let payload: MfaVerifyResponse = response
            .json()
            .await
            .map_err(|e| PegassError::decode(endpoint.as_str(), e))?;

        payload
            .session_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AuthError::MfaRejected {
                    status: payload.status,
                }
                .into()
            })
    }

    async fn redeem_session(&self, session_token: &str) -> Result<String> {
        let mut url = self.endpoints.idp(&self.endpoints.sso_redeem_path)?;
        url.query_pairs_mut().append_pair("sessionToken", session_token);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PegassError::transport(REDEEM_ENDPOINT, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PegassError::HttpStatus {
                endpoint: REDEEM_ENDPOINT.to_string(),
                status: status.as_u16(),
            });
        }
        let html = response
            .text()
            .await
            .map_err(|e| PegassError::transport(REDEEM_ENDPOINT, e))?;

        extract_hidden_field(&html, SAML_RESPONSE_FIELD).ok_or_else(|| {
            AuthError::AssertionNotFound {
                field: SAML_RESPONSE_FIELD.to_string(),
            }
            .into()
        })
    }

    async fn post_assertion(&self, assertion: &str) -> Result<SessionTicket> {
        let url = self.endpoints.app(&self.endpoints.saml_consumer_path)?;
        let response = self
            .http
            .post(url)
            .form(&[(SAML_RESPONSE_FIELD, assertion)])
            .send()
            .await
            .map_err(|e| PegassError::transport(CONSUMER_ENDPOINT, e))?;
        let status = response.status();
        debug!(status = status.as_u16(), "assertion consumed");
        if status.is_client_error() || status.is_server_error() {
            return Err(PegassError::HttpStatus {
                endpoint: CONSUMER_ENDPOINT.to_string(),
                status: status.as_u16(),
            });
        }

        self.session_cookie()
    }

    /// The one cookie the jar holds for the target application.
    fn session_cookie(&self) -> Result<SessionTicket> {
        let header = self.jar.cookies(&self.endpoints.app_base);
        let pairs: Vec<&str> = header
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .map(|raw| raw.split("; ").filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        match pairs.as_slice() {
            [pair] => {
                let pair = *pair;
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                Ok(SessionTicket::new(name, value))
            }
            _ => Err(AuthError::UnexpectedCookieCount {
                domain: self
                    .endpoints
                    .app_base
                    .host_str()
                    .unwrap_or_default()
                    .to_string(),
                count: pairs.len(),
            }
            .into()),
        }
    }
}
