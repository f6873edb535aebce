/// reqwest-backed transport
use crate::{
    config::ApiConfig,
    error::{ConsoleError, ConsoleResult},
    http::{ApiRequest, RawResponse, Transport},
};
use async_trait::async_trait;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> ConsoleResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> ConsoleResult<RawResponse> {
        let url = self.url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .header("X-Request-Id", &request.request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            ConsoleError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await?;

        Ok(RawResponse { status, body })
    }
}
