//! API client for the Bedrock server panel.
//!
//! Login and password rotation drive the session coordinator; everything
//! else is a thin binding that passes through the [`Gateway`] and hands the
//! backend's JSON back untouched.

use std::sync::Arc;

use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::password;
use crate::auth::SessionCoordinator;

use super::gateway::{LOGIN_ENDPOINT, ROTATION_ENDPOINT};
use super::{ApiError, ApiRequest, Gateway};

// ============================================================================
// Constants
// ============================================================================

/// Default number of log lines to fetch
pub const DEFAULT_LOG_LIMIT: u32 = 100;

/// Default number of console history entries to fetch
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Characters left alone when encoding a path segment (RFC 3986 unreserved)
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(
        default,
        rename = "requirePasswordChange",
        alias = "passwordChangeRequired",
        alias = "isDefaultPassword"
    )]
    require_password_change: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RotationResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    pub rotation_required: bool,
}

fn segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

pub struct ApiClient {
    gateway: Gateway,
}

impl ApiClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        self.gateway.coordinator()
    }

    async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.gateway.send(request).await?.json()
    }

    // ===== Session =====

    /// Submit the panel password. On success the session is populated,
    /// possibly flagged for rotation. Rate limiting is reported as returned
    /// and never retried here.
    pub async fn login(&self, password: &str) -> Result<LoginOutcome, ApiError> {
        if password.is_empty() {
            return Err(ApiError::ValidationRejected("Password is required".to_string()));
        }

        let request = ApiRequest::post(LOGIN_ENDPOINT).with_json(json!({ "password": password }));
        let response = match self.gateway.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e);
            }
        };

        let auth: LoginResponse = response.json()?;
        if auth.token.is_empty() {
            return Err(ApiError::InvalidResponse("Login response carried no token".to_string()));
        }
        self.coordinator()
            .on_authenticate_success(auth.token, auth.require_password_change)?;

        Ok(LoginOutcome {
            rotation_required: auth.require_password_change,
        })
    }

    /// Replace the panel password. Checked locally first; nothing is sent
    /// if the new password is unacceptable.
    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), ApiError> {
        password::check_rotation(current, new, confirm).map_err(ApiError::ValidationRejected)?;

        let request = ApiRequest::post(ROTATION_ENDPOINT).with_json(json!({
            "currentPassword": current,
            "newPassword": new,
        }));
        let response = self.gateway.send(request).await?;
        let rotated: Option<RotationResponse> = response.json()?;

        self.coordinator()
            .on_rotation_success(rotated.and_then(|r| r.token))?;
        info!("Password changed");
        Ok(())
    }

    // ===== Server control =====

    pub async fn server_status(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/status")).await
    }

    pub async fn start_server(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/start")).await
    }

    pub async fn stop_server(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/stop")).await
    }

    pub async fn restart_server(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/restart")).await
    }

    // ===== Server configuration =====

    pub async fn server_config(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/config")).await
    }

    pub async fn update_server_config(&self, config: Value) -> Result<Value, ApiError> {
        self.call(ApiRequest::put("/config").with_json(config)).await
    }

    // ===== Allowlist =====

    pub async fn allowlist(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/allowlist")).await
    }

    pub async fn add_to_allowlist(&self, entry: Value) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/allowlist").with_json(entry)).await
    }

    pub async fn remove_from_allowlist(&self, name: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete(format!("/allowlist/{}", segment(name))))
            .await
    }

    // ===== Permissions =====

    pub async fn permissions(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/permissions")).await
    }

    pub async fn update_permission(&self, permission: Value) -> Result<Value, ApiError> {
        self.call(ApiRequest::put("/permissions").with_json(permission))
            .await
    }

    pub async fn remove_permission(&self, xuid: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete(format!("/permissions/{}", segment(xuid))))
            .await
    }

    // ===== Worlds =====

    pub async fn worlds(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/worlds")).await
    }

    pub async fn upload_world(&self, file_name: &str, bytes: Vec<u8>) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/worlds/upload").with_upload("file", file_name, bytes))
            .await
    }

    pub async fn delete_world(&self, name: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete(format!("/worlds/{}", segment(name))))
            .await
    }

    pub async fn activate_world(&self, name: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::put(format!("/worlds/{}/activate", segment(name))))
            .await
    }

    // ===== Resource packs =====

    pub async fn resource_packs(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/resource-packs")).await
    }

    pub async fn upload_resource_pack(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/resource-packs/upload").with_upload("file", file_name, bytes))
            .await
    }

    pub async fn activate_resource_pack(&self, uuid: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::put(format!("/resource-packs/{}/activate", segment(uuid))))
            .await
    }

    pub async fn deactivate_resource_pack(&self, uuid: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::put(format!("/resource-packs/{}/deactivate", segment(uuid))))
            .await
    }

    pub async fn delete_resource_pack(&self, uuid: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete(format!("/resource-packs/{}", segment(uuid))))
            .await
    }

    // ===== Server versions =====

    pub async fn server_versions(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/server-versions")).await
    }

    pub async fn download_server_version(&self, version: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::post(format!("/server-versions/{}/download", segment(version))))
            .await
    }

    pub async fn download_progress(&self, version: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::get(format!("/server-versions/{}/progress", segment(version))))
            .await
    }

    pub async fn activate_server_version(&self, version: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::post(format!("/server-versions/{}/activate", segment(version))))
            .await
    }

    pub async fn update_version_config(&self, config: Value) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/server-versions/update-config").with_json(config))
            .await
    }

    // ===== Logs =====

    pub async fn logs(&self, limit: Option<u32>) -> Result<Value, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT);
        self.call(ApiRequest::get(format!("/logs?limit={}", limit))).await
    }

    pub async fn clear_logs(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete("/logs")).await
    }

    // ===== Server interaction =====

    pub async fn interaction_status(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/interaction/status")).await
    }

    pub async fn send_command(&self, command: &str) -> Result<Value, ApiError> {
        let body = json!({
            "command": command,
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.call(ApiRequest::post("/interaction/command").with_json(body))
            .await
    }

    pub async fn command_history(&self, limit: Option<u32>) -> Result<Value, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        self.call(ApiRequest::get(format!("/interaction/history?limit={}", limit)))
            .await
    }

    pub async fn clear_command_history(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete("/interaction/history")).await
    }

    // ===== Quick commands =====

    pub async fn quick_commands(&self, category: Option<&str>) -> Result<Value, ApiError> {
        let path = match category {
            Some(category) => format!("/commands?category={}", segment(category)),
            None => "/commands".to_string(),
        };
        self.call(ApiRequest::get(path)).await
    }

    pub async fn command_categories(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/commands/categories")).await
    }

    pub async fn execute_quick_command(&self, id: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::post(format!("/commands/{}/execute", segment(id))))
            .await
    }

    pub async fn add_quick_command(&self, command: Value) -> Result<Value, ApiError> {
        self.call(ApiRequest::post("/commands").with_json(command)).await
    }

    pub async fn delete_quick_command(&self, id: &str) -> Result<Value, ApiError> {
        self.call(ApiRequest::delete(format!("/commands/{}", segment(id))))
            .await
    }

    // ===== Monitoring =====

    pub async fn performance(&self) -> Result<Value, ApiError> {
        self.call(ApiRequest::get("/monitor/performance")).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join;
    use reqwest::Method;

    use super::*;
    use crate::api::RequestBody;
    use crate::auth::Session;
    use crate::navigation::{self, NavigationDecision, Navigator, LOGIN_PATH, ROTATION_PATH};
    use crate::test_support::{Harness, RecordingNavigator, ScriptedTransport};

    fn client(location: &str) -> (ApiClient, Arc<ScriptedTransport>, Arc<RecordingNavigator>) {
        let h = Harness::at(location);
        (ApiClient::new(h.gateway), h.transport, h.navigator)
    }

    fn navigate(client: &ApiClient, path: &str) -> NavigationDecision {
        let route = navigation::resolve(path).unwrap();
        navigation::evaluate(route, &client.coordinator().store().read())
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("My World"), "My%20World");
        assert_eq!(segment("1.21.0"), "1.21.0");
        assert_eq!(segment("a/b"), "a%2Fb");
    }

    #[tokio::test]
    async fn test_empty_store_is_sent_to_login() {
        let (client, _, _) = client("/");
        assert_eq!(navigate(&client, "/config"), NavigationDecision::Redirect(LOGIN_PATH));
    }

    #[tokio::test]
    async fn test_login_then_config_proceeds() {
        let (client, transport, _) = client(LOGIN_PATH);
        transport.reply(200, r#"{"token":"tok","requirePasswordChange":false}"#);

        let outcome = client.login("hunter2").await.unwrap();
        assert!(!outcome.rotation_required);
        assert_eq!(navigate(&client, "/config"), NavigationDecision::Proceed);

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::POST);
        assert!(sent[0].bearer.is_none());
        assert_eq!(
            sent[0].body,
            Some(RequestBody::Json(json!({ "password": "hunter2" })))
        );
    }

    #[tokio::test]
    async fn test_forced_rotation_then_config_proceeds() {
        let (client, transport, _) = client(LOGIN_PATH);
        transport
            .reply(200, r#"{"token":"tok","requirePasswordChange":true}"#)
            .reply(200, r#"{"message":"changed"}"#);

        assert!(client.login("admin").await.unwrap().rotation_required);
        assert_eq!(navigate(&client, "/config"), NavigationDecision::Redirect(ROTATION_PATH));
        assert_eq!(navigate(&client, ROTATION_PATH), NavigationDecision::Proceed);

        client
            .change_password("admin", "N3w-Passw0rd", "N3w-Passw0rd")
            .await
            .unwrap();
        assert_eq!(navigate(&client, "/config"), NavigationDecision::Proceed);

        let rotation = &transport.sent()[1];
        assert_eq!(rotation.path, ROTATION_ENDPOINT);
        assert_eq!(rotation.bearer.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_rotation_accepts_new_token() {
        let (client, transport, _) = client(ROTATION_PATH);
        transport
            .reply(200, r#"{"token":"old","isDefaultPassword":true}"#)
            .reply(200, r#"{"token":"new"}"#);

        client.login("admin").await.unwrap();
        client
            .change_password("admin", "N3w-Passw0rd", "N3w-Passw0rd")
            .await
            .unwrap();
        assert_eq!(
            client.coordinator().store().read(),
            Session::authenticated("new", false)
        );
    }

    #[tokio::test]
    async fn test_invalid_rotation_sends_nothing() {
        let (client, transport, _) = client(ROTATION_PATH);
        transport.reply(200, r#"{"token":"tok","requirePasswordChange":true}"#);
        client.login("admin").await.unwrap();

        let err = client
            .change_password("admin", "short", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationRejected(_)));
        assert_eq!(transport.sent().len(), 1);
        assert!(client.coordinator().store().read().password_rotation_required);
    }

    #[tokio::test]
    async fn test_backend_rejected_rotation_keeps_flag() {
        let (client, transport, _) = client(ROTATION_PATH);
        transport
            .reply(200, r#"{"token":"tok","requirePasswordChange":true}"#)
            .reply(400, r#"{"error":"current password is incorrect"}"#);
        client.login("admin").await.unwrap();

        let err = client
            .change_password("wrong", "N3w-Passw0rd", "N3w-Passw0rd")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationRejected(ref m) if m == "current password is incorrect"));
        assert_eq!(
            client.coordinator().store().read(),
            Session::authenticated("tok", true)
        );
    }

    #[tokio::test]
    async fn test_concurrent_rejections_redirect_once() {
        let (client, transport, navigator) = client("/config");
        transport
            .reply(200, r#"{"token":"tok"}"#)
            .reply(401, "")
            .reply(401, "");
        client.login("pw").await.unwrap();
        navigator.set_current("/config");

        let (first, second) = join(client.server_config(), client.server_status()).await;
        assert!(matches!(first, Err(ApiError::AuthorizationRejected)));
        assert!(matches!(second, Err(ApiError::AuthorizationRejected)));

        // Both were dispatched with the token before either answer arrived.
        let sent = transport.sent();
        assert_eq!(sent[1].bearer.as_deref(), Some("tok"));
        assert_eq!(sent[2].bearer.as_deref(), Some("tok"));

        assert_eq!(client.coordinator().store().read(), Session::default());
        assert_eq!(navigator.redirects(), vec![LOGIN_PATH.to_string()]);
        assert_eq!(navigator.current_path(), LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_rate_limited_login_surfaces_backend_values() {
        let (client, transport, navigator) = client(LOGIN_PATH);
        let body = r#"{"error":"Too many failed attempts","blockedUntil":"2026-10-19T12:30:00+08:00","retryAfter":300}"#;
        transport.reply(429, body).reply(429, body);

        for _ in 0..2 {
            match client.login("guess").await.unwrap_err() {
                ApiError::RateLimited(info) => {
                    assert_eq!(info.blocked_until.as_deref(), Some("2026-10-19T12:30:00+08:00"));
                    assert_eq!(info.retry_after, Some(300));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(transport.sent().len(), 2);
        assert_eq!(client.coordinator().store().read(), Session::default());
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_empty_password_not_sent() {
        let (client, transport, _) = client(LOGIN_PATH);
        assert!(matches!(
            client.login("").await,
            Err(ApiError::ValidationRejected(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_bindings_build_expected_requests() {
        let (client, transport, _) = client("/");
        transport.reply(200, r#"{"token":"tok"}"#);
        client.login("pw").await.unwrap();

        client.remove_from_allowlist("Steve Jobs").await.unwrap();
        client.activate_world("Bedrock level").await.unwrap();
        client.logs(None).await.unwrap();
        client.command_history(Some(10)).await.unwrap();
        client.quick_commands(Some("time")).await.unwrap();
        client.send_command("say hi").await.unwrap();

        let sent: Vec<_> = transport
            .sent()
            .into_iter()
            .skip(1)
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(
            sent,
            vec![
                (Method::DELETE, "/allowlist/Steve%20Jobs".to_string()),
                (Method::PUT, "/worlds/Bedrock%20level/activate".to_string()),
                (Method::GET, "/logs?limit=100".to_string()),
                (Method::GET, "/interaction/history?limit=10".to_string()),
                (Method::GET, "/commands?category=time".to_string()),
                (Method::POST, "/interaction/command".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_is_multipart() {
        let (client, transport, _) = client("/");
        client.upload_world("world.mcworld", vec![1, 2, 3]).await.unwrap();

        let sent = transport.sent();
        assert_eq!(
            sent[0].body,
            Some(RequestBody::Upload {
                field: "file".to_string(),
                file_name: "world.mcworld".to_string(),
                bytes: vec![1, 2, 3],
            })
        );
    }
}
