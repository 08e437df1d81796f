//! Core error types for pegass-core.
//!
//! `PegassError` is the crate-wide error. Authentication failures live in
//! [`AuthError`] and are always fatal to the caller; configuration and input
//! validation keep their own enums. [`PegassError::kind`] maps every variant
//! onto the coarse taxonomy callers log and branch on.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pegass-core.
#[derive(Error, Debug)]
pub enum PegassError {
    /// Network or transport failure talking to `endpoint`.
    #[error("Transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status on a REST call.
    #[error("{endpoint} answered HTTP {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// Malformed JSON or HTML.
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Authentication handshake failures.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A paginated listing never signalled its last page.
    #[error("{endpoint} still had pages after {cap} requests")]
    PaginationLimit { endpoint: String, cap: u32 },

    /// No persisted session ticket, or the file could not be parsed.
    #[error("No usable session ticket at {path}: {message}")]
    TicketNotFound { path: PathBuf, message: String },

    /// Lookup by name or key yielded nothing.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// A message sink refused a message.
    #[error("Failed to deliver message to {recipient}: {message}")]
    Delivery { recipient: String, message: String },

    /// Filesystem errors.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization errors on data we produce ourselves.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error taxonomy shared by logs and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    ProtocolState,
    NotFound,
    Io,
    Config,
    Validation,
}

impl PegassError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PegassError::Transport { .. } | PegassError::Delivery { .. } => ErrorKind::Transport,
            PegassError::HttpStatus { .. } => ErrorKind::ProtocolState,
            PegassError::Decode { .. } | PegassError::Json(_) => ErrorKind::Decode,
            PegassError::Auth(err) => err.kind(),
            PegassError::PaginationLimit { .. } => ErrorKind::ProtocolState,
            PegassError::TicketNotFound { .. } | PegassError::NotFound { .. } => {
                ErrorKind::NotFound
            }
            PegassError::Io { .. } => ErrorKind::Io,
            PegassError::Config(_) => ErrorKind::Config,
            PegassError::Validation(_) => ErrorKind::Validation,
        }
    }

    pub(crate) fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        PegassError::Transport {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub(crate) fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        PegassError::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

/// Failures of the password + TOTP + SAML handshake.
///
/// None of these are retried: every step consumes a single-use token.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Password step did not ask for a second factor.
    #[error("expected identity provider status '{expected}' but got '{actual}'")]
    UnexpectedStatus { expected: String, actual: String },

    /// No TOTP generator enrolled on the account.
    #[error("no TOTP generator is enrolled on this account (factors offered: {offered:?})")]
    NoMfaFactor { offered: Vec<String> },

    /// Shared secret could not be turned into a code.
    #[error("invalid TOTP secret: {0}")]
    InvalidTotpSecret(String),

    /// Verify step did not hand back a session token.
    #[error("MFA code rejected (status: {status})")]
    MfaRejected { status: String },

    /// Session redeem page carried no SAML assertion.
    #[error("no '{field}' hidden field in the session redeem page")]
    AssertionNotFound { field: String },

    /// The SAML consumer must set exactly one cookie on the target domain.
    #[error("expected exactly one session cookie for {domain}, found {count}")]
    UnexpectedCookieCount { domain: String, count: usize },
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::NoMfaFactor { .. } => ErrorKind::NotFound,
            AuthError::InvalidTotpSecret(_) => ErrorKind::Config,
            AuthError::AssertionNotFound { .. } => ErrorKind::Decode,
            AuthError::UnexpectedStatus { .. }
            | AuthError::MfaRejected { .. }
            | AuthError::UnexpectedCookieCount { .. } => ErrorKind::ProtocolState,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid date range
    #[error("Invalid date range: end ({end}) must not precede start ({start})")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Unmapped (roleType, roleCode) pair met while classifying registrants.
///
/// Never returned as an `Err`; it is logged and counted as unknown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no classification for role type '{role_type}' code '{role_code}'")]
pub struct ClassificationGap {
    pub role_type: String,
    pub role_code: String,
}

/// Result type alias for PegassError
pub type Result<T, E = PegassError> = std::result::Result<T, E>;
