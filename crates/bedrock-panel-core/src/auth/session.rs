use serde::{Deserialize, Serialize};

/// The client's record of whether it holds a credential for the panel
/// backend, and whether that credential must be rotated before anything
/// else is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub password_rotation_required: bool,
}

/// Coarse session state, derived from a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    AuthenticatedPendingRotation,
}

impl Session {
    pub fn authenticated(token: impl Into<String>, password_rotation_required: bool) -> Self {
        Self {
            token: Some(token.into()),
            password_rotation_required,
        }
        .normalized()
    }

    /// An unauthenticated session can never be pending rotation; an empty
    /// token counts as no token.
    pub fn normalized(mut self) -> Self {
        if self.token.as_deref().is_some_and(str::is_empty) {
            self.token = None;
        }
        if self.token.is_none() {
            self.password_rotation_required = false;
        }
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn state(&self) -> SessionState {
        match (&self.token, self.password_rotation_required) {
            (None, _) => SessionState::Unauthenticated,
            (Some(_), false) => SessionState::Authenticated,
            (Some(_), true) => SessionState::AuthenticatedPendingRotation,
        }
    }
}
