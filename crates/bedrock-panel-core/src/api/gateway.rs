//! Mediates every call to the panel backend.
//!
//! The gateway is an explicit two-phase pipeline around an injected
//! [`Transport`]:
//! - `outbound`: attaches the current token as a bearer credential, except on
//!   the login submission which is never credentialed
//! - `inbound`: passes successes through and classifies failures; a rejected
//!   credential clears the session and sends the front-end to the login view
//!
//! The gateway never retries.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::SessionCoordinator;
use crate::navigation::{self, Navigator, LOGIN_PATH};

use super::{ApiError, ApiRequest, ApiResponse, Transport};

/// Login submission endpoint.
pub const LOGIN_ENDPOINT: &str = "/auth/login";

/// Credential rotation endpoint.
pub const ROTATION_ENDPOINT: &str = "/auth/change-password";

pub struct Gateway {
    transport: Arc<dyn Transport>,
    coordinator: Arc<SessionCoordinator>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        coordinator: Arc<SessionCoordinator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            coordinator,
            navigator,
        }
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    fn is_login_submission(request: &ApiRequest) -> bool {
        request.route() == LOGIN_ENDPOINT
    }

    /// Snapshot the token onto the request.
    pub fn outbound(&self, mut request: ApiRequest) -> ApiRequest {
        request.bearer = if Self::is_login_submission(&request) {
            None
        } else {
            self.coordinator.store().token()
        };
        request
    }

    /// Classify the backend's answer to `request`.
    pub fn inbound(&self, request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.is_success() {
            return Ok(response);
        }

        match ApiError::from_status(response.status, &response.body) {
            ApiError::AuthorizationRejected if Self::is_login_submission(request) => {
                Err(ApiError::InvalidCredentials)
            }
            ApiError::AuthorizationRejected => {
                warn!(path = %request.path, "Credential rejected");
                self.reject_session()?;
                Err(ApiError::AuthorizationRejected)
            }
            other => {
                debug!(path = %request.path, status = response.status, error = %other, "Request failed");
                Err(other)
            }
        }
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = self.outbound(request);
        // Body-less copy kept for response handling.
        let summary = ApiRequest::new(request.method.clone(), request.path.clone());
        debug!(
            method = %request.method,
            path = %request.path,
            credentialed = request.bearer.is_some(),
            "Dispatching request"
        );

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(path = %summary.path, error = %e, "Transport failure");
            ApiError::Transport(e)
        })?;

        self.inbound(&summary, response)
    }

    fn reject_session(&self) -> Result<(), ApiError> {
        self.coordinator.on_authorization_failure()?;

        let current = self.navigator.current_path();
        let on_login = navigation::resolve(&current).is_some_and(|r| r.is_login());
        if !on_login {
            debug!(from = %current, "Redirecting to login");
            self.navigator.redirect(LOGIN_PATH);
        }
        Ok(())
    }
}
