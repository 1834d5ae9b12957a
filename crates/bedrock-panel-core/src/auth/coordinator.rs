use std::sync::Arc;

use tracing::{debug, info};

use super::{CredentialStore, Session, StoreError};

/// The only writer of the [`CredentialStore`].
///
/// Views and the gateway ask for transitions here instead of touching the
/// store directly. Every method returns whether the session actually
/// changed; clearing an already-empty session is a no-op.
pub struct SessionCoordinator {
    store: Arc<CredentialStore>,
}

impl SessionCoordinator {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Read access for everybody else.
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn on_authenticate_success(
        &self,
        token: impl Into<String>,
        rotation_required: bool,
    ) -> Result<bool, StoreError> {
        let changed = self
            .store
            .write(Session::authenticated(token, rotation_required))?;
        info!(rotation_required, "Authenticated");
        Ok(changed)
    }

    /// Clear the rotation flag, swapping in `new_token` when the backend
    /// issued one.
    pub fn on_rotation_success(&self, new_token: Option<String>) -> Result<bool, StoreError> {
        let current = self.store.read();
        let Some(token) = new_token.or(current.token) else {
            debug!("Rotation succeeded without a session, nothing to update");
            return Ok(false);
        };
        let changed = self.store.write(Session::authenticated(token, false))?;
        info!("Password rotated");
        Ok(changed)
    }

    pub fn on_logout(&self) -> Result<bool, StoreError> {
        let changed = self.clear()?;
        if changed {
            info!("Logged out");
        }
        Ok(changed)
    }

    pub fn on_authorization_failure(&self) -> Result<bool, StoreError> {
        let changed = self.clear()?;
        if changed {
            info!("Credential rejected by backend, session cleared");
        } else {
            debug!("Credential rejected again, session already clear");
        }
        Ok(changed)
    }

    fn clear(&self) -> Result<bool, StoreError> {
        self.store.write(Session::default())
    }
}
