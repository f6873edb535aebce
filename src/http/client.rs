/// API client: the single request interceptor
use crate::{
    error::{ConsoleError, ConsoleResult},
    http::{ApiRequest, Envelope, RawResponse, Transport},
    session::Session,
};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Cheap to clone; every manager holds its own handle
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ConsoleResult<T> {
        self.execute(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ConsoleResult<T> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ConsoleResult<T> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        self.execute(Method::DELETE, path, &[], None).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> ConsoleResult<T> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
            bearer: self.session.token(),
            request_id: Uuid::new_v4().to_string(),
        };

        let span = tracing::debug_span!(
            "api_request",
            method = %request.method,
            path = %request.path,
            request_id = %request.request_id,
        );

        async move {
            let response = self.transport.send(request).await?;
            self.intercept(response)
        }
        .instrument(span)
        .await
    }

    fn intercept<T: DeserializeOwned>(&self, response: RawResponse) -> ConsoleResult<T> {
        debug!("response status {}", response.status);

        if response.status == 401 {
            self.session.expire("HTTP 401");
            return Err(ConsoleError::Authentication("HTTP 401".to_string()));
        }

        let envelope = match Envelope::parse(&response.body) {
            Ok(envelope) => envelope,
            Err(e) if response.status >= 400 => {
                warn!("Non-envelope error response ({}): {}", response.status, e);
                return Err(ConsoleError::Server {
                    code: i64::from(response.status),
                    message: String::new(),
                });
            }
            Err(e) => return Err(e),
        };

        if envelope.is_auth_failure() {
            self.session.expire(&format!("code {}", envelope.code));
        }

        envelope.into_data()
    }
}
