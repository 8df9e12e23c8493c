//! Transport-specific telemetry sources and the live view model for
//! FleetPulse
//!
//! `PushSource` (WebSocket) is the canonical transport; `PollSource`
//! (live + history endpoints) is the configured fallback. Both normalize
//! into the same sample shape and feed the `LiveTelemetryView`.

pub mod config;
pub mod http;
pub mod poll;
pub mod push;
pub mod selector;
pub mod view;

pub use config::{ClientConfig, Transport};
pub use http::ApiClient;
pub use poll::PollSource;
pub use push::PushSource;
pub use selector::{VehicleSelector, DEFAULT_VEHICLE_ID};
pub use view::LiveTelemetryView;
