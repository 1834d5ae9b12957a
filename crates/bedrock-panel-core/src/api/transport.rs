//! Requests, responses and the transport that carries them.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{header, multipart, Client, Method};
use serde::de::DeserializeOwned;

use super::{ApiError, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// A single file sent as `multipart/form-data`.
    Upload {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// An outbound call, relative to the panel API root.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<RequestBody>,
    /// Filled in by the gateway; anything set by the caller is replaced.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_upload(mut self, field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Upload {
            field: field.to_string(),
            file_name: file_name.to_string(),
            bytes,
        });
        self
    }

    /// Path without query string or fragment.
    pub fn route(&self) -> &str {
        self.path.split(['?', '#']).next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Carries a request to the backend and brings back whatever it answered.
///
/// Any HTTP status is a successful send; only network-level failures are
/// errors here.
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>>;
}

/// [`Transport`] over `reqwest`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_root: String,
}

impl HttpTransport {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_root: format!("{}/api", server_url.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        async move {
            let url = self.url(&request.path);
            let mut builder = self
                .client
                .request(request.method, &url)
                .header(header::ACCEPT, "application/json");

            if let Some(token) = request.bearer {
                builder = builder.bearer_auth(token);
            }

            builder = match request.body {
                Some(RequestBody::Json(value)) => builder.json(&value),
                Some(RequestBody::Upload {
                    field,
                    file_name,
                    bytes,
                }) => {
                    let part = multipart::Part::bytes(bytes).file_name(file_name);
                    builder.multipart(multipart::Form::new().part(field, part))
                }
                None => builder,
            };

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(ApiResponse { status, body })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_strips_query() {
        assert_eq!(ApiRequest::get("/logs?limit=100").route(), "/logs");
        assert_eq!(ApiRequest::post("/auth/login").route(), "/auth/login");
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let value: serde_json::Value = ApiResponse::new(204, "").json().unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_malformed_body_is_invalid_response() {
        let result: Result<serde_json::Value, _> = ApiResponse::new(200, "<html>").json();
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_url_joins_api_root() {
        let transport = HttpTransport::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.url("/status"), "http://localhost:8080/api/status");
    }
}
