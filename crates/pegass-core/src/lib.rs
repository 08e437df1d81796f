//! # Pegass Core Library
//!
//! Client for the Red Cross volunteer-management application ("Pegass")
//! behind its single sign-on, plus the daily activity digest built from its
//! roster and scheduling data.
//!
//! ## Architecture
//!
//! - **Auth**: password + TOTP + SAML handshake against the identity provider,
//!   producing a single session cookie
//! - **Storage**: persisted session ticket and TOML-based configuration
//! - **Client**: session context with validation and serialized re-authentication
//! - **Pagination**: one loop for every listing, whatever its envelope
//! - **Summary**: classification of registrants and the rendered digest
//!
//! ## Key Components
//!
//! - [`PegassClient`]: session context every query runs through
//! - [`SessionStore`]: ticket persistence
//! - [`Config`]: application configuration management
//! - [`MessageSink`]: delivery seam for digests

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod roster;
pub mod stats;
pub mod storage;
pub mod summary;

pub use client::PegassClient;
pub use error::{AuthError, ConfigError, ErrorKind, PegassError, Result, ValidationError};
pub use model::{ActivityKind, DateRange, Role, RoleType, RosterEntry};
pub use notify::{parse_command, DigestService, MessageSink};
pub use stats::{MemberCounters, StatsRoleTable};
pub use storage::{Config, FileSessionStore, MemorySessionStore, SessionStore, SessionTicket};
pub use summary::{RoleClassification, RoleTable, NO_ACTIVITY};
