//! REST client for the Bedrock server panel backend.
//!
//! This module provides the `Gateway` that every call passes through, the
//! `Transport` it dispatches on, and the `ApiClient` bindings built on top.
//!
//! The backend uses bearer token authentication obtained from `/auth/login`.

pub mod client;
pub mod error;
pub mod gateway;
pub mod transport;

pub use client::{ApiClient, LoginOutcome};
pub use error::{ApiError, RateLimitInfo, TransportError};
pub use gateway::{Gateway, LOGIN_ENDPOINT, ROTATION_ENDPOINT};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
