/// HTTP layer
///
/// Requests go through a pluggable [`Transport`] so the managers above can
/// be driven by reqwest in production and by a scripted transport in tests.
/// [`ApiClient`] is the single interceptor: it attaches the bearer token,
/// decodes the response envelope and reacts to rejected sessions.

pub mod client;
pub mod envelope;
pub mod reqwest_transport;

pub use client::ApiClient;
pub use envelope::{Envelope, PageData, AUTH_EXPIRED_CODES};
pub use reqwest_transport::ReqwestTransport;

use crate::error::ConsoleResult;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// A request as seen by the transport
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, always starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
    pub request_id: String,
}

impl ApiRequest {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response before envelope decoding
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport backend trait
///
/// Implementations only move bytes. Connectivity failures must be returned
/// as `ConsoleError::Connectivity`; every HTTP status, including errors, is
/// a successful `RawResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ConsoleResult<RawResponse>;
}
