use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::model::{ApiRequest, SharedTransport, TransportError};
use crate::extensions::option::NonBlankExt;
use crate::pedal::model::PedalMapping;

pub const UNKNOWN_API_CALL_ERROR: &str = "Unknown API call error";

/// Result of a pedal write. Failures never escape as errors.
#[derive(Clone, Debug, PartialEq)]
pub enum SetPedalsOutcome {
    Applied { data: Value },
    Rejected { message: String },
}

impl SetPedalsOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SetPedalsOutcome::Applied { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SetPedalsOutcome::Applied { .. } => None,
            SetPedalsOutcome::Rejected { message } => Some(message),
        }
    }
}

impl Serialize for SetPedalsOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut outcome = serializer.serialize_struct("SetPedalsOutcome", 2)?;
        match self {
            SetPedalsOutcome::Applied { data } => {
                outcome.serialize_field("ok", &true)?;
                outcome.serialize_field("data", data)?;
            }
            SetPedalsOutcome::Rejected { message } => {
                outcome.serialize_field("ok", &false)?;
                outcome.serialize_field("message", message)?;
            }
        }
        outcome.end()
    }
}

/// Picks the message shown for a failed write: the backend's own error
/// first, then the transport's wording, then a fixed fallback.
/// Blank candidates are skipped.
pub fn failure_message(structured: Option<&str>, transport: Option<&str>) -> String {
    [structured, transport]
        .into_iter()
        .find_map(|candidate| candidate.non_blank())
        .unwrap_or(UNKNOWN_API_CALL_ERROR)
        .to_owned()
}

impl From<TransportError> for SetPedalsOutcome {
    fn from(error: TransportError) -> Self {
        let description = error.description();
        SetPedalsOutcome::Rejected {
            message: failure_message(error.error_message(), description.as_deref()),
        }
    }
}

/// Reads and replaces the pedal mapping held by the backend.
pub struct PedalGateway {
    transport: SharedTransport,
}

impl PedalGateway {
    pub fn new(transport: SharedTransport) -> PedalGateway {
        PedalGateway { transport }
    }

    pub async fn get_pedals(&self) -> Result<PedalMapping, TransportError> {
        self.transport.send(ApiRequest::get("/pedals")).await?.json()
    }

    /// Sends `mapping` as the complete desired state. Pedals missing from
    /// it are not kept on the client's behalf.
    pub async fn set_pedals(&self, mapping: &PedalMapping) -> SetPedalsOutcome {
        let body = match serde_json::to_value(mapping) {
            Ok(body) => body,
            Err(e) => {
                return SetPedalsOutcome::Rejected {
                    message: failure_message(None, Some(e.to_string().as_str())),
                }
            }
        };

        match self
            .transport
            .send(ApiRequest::post("/pedals").with_body(body))
            .await
        {
            Ok(response) => {
                debug!(pedals = mapping.len(), "pedal mapping replaced");
                SetPedalsOutcome::Applied {
                    data: response.body.unwrap_or(Value::Null),
                }
            }
            Err(error) => {
                let outcome = SetPedalsOutcome::from(error);
                warn!(reason = outcome.message(), "pedal mapping rejected");
                outcome
            }
        }
    }
}
