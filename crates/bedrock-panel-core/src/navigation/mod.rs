//! Route table and the per-navigation guard.
//!
//! Redirects are requested through the [`Navigator`] trait so the guard and
//! the gateway never depend on a concrete front-end.

pub mod guard;
pub mod routes;

use std::sync::{Mutex, PoisonError};

pub use guard::{evaluate, NavigationDecision};
pub use routes::{resolve, Route, RouteAccess, LANDING_PATH, LOGIN_PATH, ROTATION_PATH};

/// The front-end's notion of "where am I" and "go there".
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Fire-and-forget: the front-end follows it when it next gets control.
    fn redirect(&self, path: &str);
}

#[derive(Debug, Default)]
struct LocationState {
    current: String,
    pending: Option<String>,
}

/// Navigator that keeps the location in memory.
///
/// A redirect moves the current location immediately and leaves a pending
/// entry for the front-end to pick up with [`take_pending`](Self::take_pending).
#[derive(Debug)]
pub struct LocationNavigator {
    state: Mutex<LocationState>,
}

impl LocationNavigator {
    pub fn new(initial: &str) -> Self {
        Self {
            state: Mutex::new(LocationState {
                current: initial.to_string(),
                ..Default::default()
            }),
        }
    }

    /// Record that the front-end is now showing `path`.
    pub fn set_current(&self, path: &str) {
        self.lock().current = path.to_string();
    }

    pub fn take_pending(&self) -> Option<String> {
        self.lock().pending.take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LocationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for LocationNavigator {
    fn current_path(&self) -> String {
        self.lock().current.clone()
    }

    fn redirect(&self, path: &str) {
        let mut state = self.lock();
        state.current = path.to_string();
        state.pending = Some(path.to_string());
    }
}
