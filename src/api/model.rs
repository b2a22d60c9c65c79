use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::extensions::option::NonBlankExt;

/// Every route lives under this prefix on the backend.
pub const API_BASE_PATH: &str = "/api";

/// Per-call budget before the transport gives up.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One request against the backend. `path` is relative to [`API_BASE_PATH`]
/// and may carry a query string.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> ApiRequest {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> ApiRequest {
        ApiRequest {
            method: Method::Post,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(self, body: Value) -> ApiRequest {
        ApiRequest {
            body: Some(body),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> ApiResponse {
        ApiResponse {
            status: 200,
            body: Some(body),
        }
    }

    pub fn empty() -> ApiResponse {
        ApiResponse {
            status: 200,
            body: None,
        }
    }

    /// Decodes the body into `T`. A missing body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        serde_json::from_value(self.body.unwrap_or(Value::Null))
            .map_err(|e| TransportError::Decode(format!("invalid response payload: {e}")))
    }
}

/// Failure of a single exchange with the backend.
#[derive(Clone, Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Option<Value> },
    #[error("timeout of {0}ms exceeded")]
    Timeout(u64),
    /// The request never reached the backend (refused, no route, DNS).
    #[error("{0}")]
    Unreachable(String),
    /// The backend was reached but the exchange broke off.
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Decode(String),
}

impl TransportError {
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Domain error reported by the backend in the `errorMessage` field.
    pub fn error_message(&self) -> Option<&str> {
        self.body()
            .and_then(|body| body.get("errorMessage"))
            .and_then(Value::as_str)
            .non_blank()
    }

    /// The transport's own wording, if it has any.
    pub fn description(&self) -> Option<String> {
        let text = self.to_string();
        Some(text.as_str()).non_blank().map(str::to_owned)
    }

    /// True when the backend went away mid-exchange, which is what a
    /// successful quit looks like from this side. A backend that could not
    /// be reached at all is not a drop.
    pub fn is_connection_drop(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

#[async_trait]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

// Thread safe type alias
pub type SharedTransport = Arc<dyn Transport + Send + Sync + 'static>;
