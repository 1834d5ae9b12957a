use crate::auth::{Session, SessionState};

use super::routes::{Route, LANDING_PATH, LOGIN_PATH, ROTATION_PATH};

/// Outcome of evaluating a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Proceed,
    Redirect(&'static str),
}

/// Decide whether navigating to `target` may proceed given `session`.
///
/// Rules, first match wins:
/// 1. authenticated route without a token goes to the login view
/// 2. a session holder asking for the login view is sent to the rotation
///    view when rotation is pending, otherwise to the landing view
/// 3. while rotation is pending, everything except the rotation view itself
///    goes to the rotation view, whatever its declared access
/// 4. otherwise proceed
pub fn evaluate(target: &Route, session: &Session) -> NavigationDecision {
    use NavigationDecision::*;

    match session.state() {
        SessionState::Unauthenticated if target.requires_auth() => Redirect(LOGIN_PATH),
        SessionState::Authenticated if target.is_login() => Redirect(LANDING_PATH),
        SessionState::AuthenticatedPendingRotation if !target.is_rotation() => {
            Redirect(ROTATION_PATH)
        }
        _ => Proceed,
    }
}
