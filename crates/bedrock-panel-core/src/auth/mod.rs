//! Session state for the panel client.
//!
//! This module provides:
//! - `Session`: the token plus the "password rotation required" flag
//! - `CredentialStore`: the persisted holder of the current session
//! - `SessionCoordinator`: the single writer of the store
//! - `password`: local checks on a replacement password
//!
//! Sessions are persisted to disk (or the OS keychain) and survive restarts.

pub mod coordinator;
pub mod password;
pub mod session;
pub mod store;

pub use coordinator::SessionCoordinator;
pub use session::{Session, SessionState};
pub use store::{CredentialStore, FileBackend, KeyringBackend, MemoryBackend, SessionBackend, StoreError};
