use serde::Deserialize;
use serde_json::Value;

use crate::api::model::{ApiRequest, SharedTransport, TransportError};
use crate::pedal::model::ValidKeys;

/// Envelope the backend uses for every flag.
#[derive(Debug, Deserialize)]
struct BooleanResponse {
    value: bool,
}

/// Device settings and lifecycle calls.
/// Stateless: each method is exactly one request and errors come back untouched.
pub struct Settings {
    transport: SharedTransport,
}

impl Settings {
    pub fn new(transport: SharedTransport) -> Settings {
        Settings { transport }
    }

    pub async fn get_boot(&self) -> Result<bool, TransportError> {
        self.flag(ApiRequest::get("/boot")).await
    }

    /// Flips start-on-boot and returns the new value.
    pub async fn toggle_boot(&self) -> Result<bool, TransportError> {
        self.flag(ApiRequest::post("/boot")).await
    }

    pub async fn get_enabled(&self) -> Result<bool, TransportError> {
        self.flag(ApiRequest::get("/enabled")).await
    }

    /// Flips the device active state and returns the new value.
    pub async fn toggle_enabled(&self) -> Result<bool, TransportError> {
        self.flag(ApiRequest::post("/enabled")).await
    }

    /// Asks whether a firmware update is available. `force` makes the
    /// backend skip its cached answer.
    pub async fn get_update(&self, force: bool) -> Result<bool, TransportError> {
        self.flag(ApiRequest::get(format!("/update?force={force}"))).await
    }

    pub async fn get_update_default(&self) -> Result<bool, TransportError> {
        self.get_update(false).await
    }

    /// Asks the backend to exit. The connection may drop right after the
    /// reply; see [`TransportError::is_connection_drop`].
    pub async fn quit_app(&self) -> Result<(), TransportError> {
        self.transport.send(ApiRequest::post("/quit")).await?;
        Ok(())
    }

    pub async fn get_serial(&self) -> Result<Value, TransportError> {
        self.transport.send(ApiRequest::get("/serial")).await?.json()
    }

    pub async fn get_logs(&self) -> Result<Value, TransportError> {
        self.transport.send(ApiRequest::get("/logs")).await?.json()
    }

    pub async fn get_valid_keys(&self) -> Result<ValidKeys, TransportError> {
        self.transport
            .send(ApiRequest::get("/valid-keys"))
            .await?
            .json()
    }

    async fn flag(&self, request: ApiRequest) -> Result<bool, TransportError> {
        let response: BooleanResponse = self.transport.send(request).await?.json()?;
        Ok(response.value)
    }
}
