pub mod auth;
pub mod config;
pub mod digest;
pub mod roster;
pub mod stats;
pub mod summary;
