//! Client for the StepKeys pedal backend: device settings, lifecycle calls
//! and the pedal-to-action mapping.

pub mod api;
pub mod configuration;
pub mod extensions;
pub mod pedal;
pub mod settings;

pub use api::model::{SharedTransport, Transport, TransportError};
pub use pedal::gateway::{PedalGateway, SetPedalsOutcome};
pub use pedal::model::{PedalAction, PedalBehaviour, PedalKeys, PedalMapping, PedalMode};
pub use settings::Settings;
