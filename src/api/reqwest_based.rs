use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::api::model::{ApiRequest, ApiResponse, Method, Transport, TransportError, API_BASE_PATH};
use crate::configuration::ClientConfig;

pub struct ReqwestBased {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl ReqwestBased {
    pub fn new(config: &ClientConfig) -> anyhow::Result<ReqwestBased> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let base_url = format!("{}{API_BASE_PATH}", config.backend.trim_end_matches('/'));

        Ok(ReqwestBased {
            client,
            base_url,
            timeout_ms: config.timeout_ms,
        })
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout_ms)
        } else if error.is_connect() {
            TransportError::Unreachable(error.to_string())
        } else if error.is_decode() {
            TransportError::Decode(error.to_string())
        } else {
            TransportError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestBased {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, %url, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        // Non-JSON bodies are dropped; only structured payloads matter here.
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };
        debug!(status = status.as_u16(), %url, "received response");

        if status.is_success() {
            Ok(ApiResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
