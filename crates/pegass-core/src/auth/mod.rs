//! Single sign-on against the identity provider.

mod flow;
pub mod saml;
pub mod totp;

pub use flow::{AuthEndpoints, AuthFlow, AuthState};
