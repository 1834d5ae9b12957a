//! Core library for bedrock-panel.
//!
//! The console talks to a Bedrock dedicated server's management panel over
//! REST. This crate holds everything except the front-end:
//!
//! - `auth`: the persisted session and its single writer
//! - `navigation`: the route table and the per-navigation guard
//! - `api`: the request gateway, its transport and the endpoint bindings
//! - `config`: where the panel lives and where the session is kept

pub mod api;
pub mod auth;
pub mod config;
pub mod navigation;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, Gateway, HttpTransport};
pub use auth::{CredentialStore, Session, SessionCoordinator, SessionState};
pub use config::Config;
pub use navigation::{LocationNavigator, NavigationDecision, Navigator};
