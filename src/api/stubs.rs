use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

use crate::api::model::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use crate::pedal::model::{PedalMapping, ValidKeys};

pub struct AlwaysFail(pub TransportError);

#[async_trait]
impl Transport for AlwaysFail {
    async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
        Err(self.0.clone())
    }
}

struct BackendState {
    boot: bool,
    enabled: bool,
    update_available: bool,
    forced_update_checks: usize,
    quit: bool,
    serial: String,
    logs: Vec<String>,
    valid_keys: ValidKeys,
    pedals: PedalMapping,
}

/// Emulates the device backend in process, following the same routes,
/// envelopes and error bodies. Every request line is recorded.
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    requests: Mutex<Vec<String>>,
}

const DEFAULT_VALID_KEYS: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "ctrl",
    "shift", "alt", "cmd", "tab", "enter", "escape", "space", "backspace", "delete", "up", "down",
    "left", "right", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
];

impl Default for InMemoryBackend {
    fn default() -> Self {
        InMemoryBackend::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> InMemoryBackend {
        InMemoryBackend {
            state: Mutex::new(BackendState {
                boot: false,
                enabled: false,
                update_available: false,
                forced_update_checks: 0,
                quit: false,
                serial: "SK-0000-OFFLINE".to_owned(),
                logs: vec!["backend started".to_owned()],
                valid_keys: DEFAULT_VALID_KEYS.iter().copied().collect(),
                pedals: PedalMapping::new(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pedals(self, pedals: PedalMapping) -> InMemoryBackend {
        self.update(|state| state.pedals = pedals);
        self
    }

    pub fn with_valid_keys(self, valid_keys: ValidKeys) -> InMemoryBackend {
        self.update(|state| state.valid_keys = valid_keys);
        self
    }

    pub fn with_update_available(self, available: bool) -> InMemoryBackend {
        self.update(|state| state.update_available = available);
        self
    }

    /// Request lines seen so far, e.g. `GET /update?force=true`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn forced_update_checks(&self) -> usize {
        self.read(|state| state.forced_update_checks)
    }

    pub fn has_quit(&self) -> bool {
        self.read(|state| state.quit)
    }

    fn update<F: FnOnce(&mut BackendState)>(&self, f: F) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut *state)
        }
    }

    fn read<A, F: FnOnce(&BackendState) -> A>(&self, f: F) -> A
    where
        A: Default,
    {
        self.state.lock().map(|state| f(&*state)).unwrap_or_default()
    }

    fn route(state: &mut BackendState, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let (path, query) = request
            .path
            .split_once('?')
            .unwrap_or((request.path.as_str(), ""));

        match (path, request.method) {
            ("/boot", Method::Get) => Ok(boolean(state.boot)),
            ("/boot", Method::Post) => {
                state.boot = !state.boot;
                Ok(boolean(state.boot))
            }
            ("/enabled", Method::Get) => Ok(boolean(state.enabled)),
            ("/enabled", Method::Post) => {
                state.enabled = !state.enabled;
                Ok(boolean(state.enabled))
            }
            ("/update", Method::Get) => {
                let forced = query
                    .split('&')
                    .any(|pair| pair == "force=true" || pair == "force=1");
                if forced {
                    state.forced_update_checks += 1;
                }
                Ok(boolean(state.update_available))
            }
            ("/quit", Method::Post) => {
                state.quit = true;
                Ok(ApiResponse::empty())
            }
            ("/serial", Method::Get) => Ok(ApiResponse::ok(json!(state.serial))),
            ("/logs", Method::Get) => Ok(ApiResponse::ok(json!(state.logs))),
            ("/valid-keys", Method::Get) => Ok(ApiResponse::ok(json!(state.valid_keys))),
            ("/pedals", Method::Get) => Ok(ApiResponse::ok(json!(state.pedals))),
            ("/pedals", Method::Post) => Self::replace_pedals(state, request.body),
            ("/boot" | "/enabled" | "/update" | "/quit" | "/pedals", _) => {
                Err(rejected(405, "Method not allowed."))
            }
            _ => Err(TransportError::Status {
                status: 404,
                body: None,
            }),
        }
    }

    fn replace_pedals(
        state: &mut BackendState,
        body: Option<Value>,
    ) -> Result<ApiResponse, TransportError> {
        let mapping: PedalMapping = body
            .and_then(|body| serde_json::from_value(body).ok())
            .ok_or_else(|| rejected(400, "Invalid JSON payload"))?;

        if let Some((pedal, _)) = mapping.unknown_keys(&state.valid_keys).first() {
            return Err(rejected(
                400,
                &format!("Invalid pedal configuration: Pedal \"{pedal}\": contains invalid keys"),
            ));
        }

        state.pedals = mapping;
        Ok(ApiResponse::ok(json!(state.pedals)))
    }
}

fn boolean(value: bool) -> ApiResponse {
    ApiResponse::ok(json!({ "value": value }))
}

fn rejected(status: u16, message: &str) -> TransportError {
    TransportError::Status {
        status,
        body: Some(json!({ "status": status, "errorMessage": message })),
    }
}

#[async_trait]
impl Transport for InMemoryBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(format!("{} {}", request.method, request.path));
        }

        let mut state = self
            .state
            .lock()
            .map_err(|_| TransportError::Network("backend state poisoned".to_owned()))?;
        if state.quit {
            return Err(TransportError::Unreachable(
                "connect ECONNREFUSED".to_owned(),
            ));
        }
        InMemoryBackend::route(&mut state, request)
    }
}
