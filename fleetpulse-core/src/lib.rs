//! FleetPulse Core Library
//!
//! This crate provides the transport-agnostic pieces of the live telemetry
//! view model: the unified sample model, the bounded history buffer, the
//! derived-series projector, the role capability table and the source
//! interface both transports implement.

pub mod buffer;
pub mod error;
pub mod model;
pub mod roles;
pub mod series;
pub mod source;
pub mod units;

pub use buffer::HistoryBuffer;
pub use error::TelemetryError;
pub use model::{ConnectionState, EngineStatus, TelemetrySample, Vehicle};
pub use roles::{Capability, Role};
pub use source::{SourceEvent, Subscription, TelemetrySource};
