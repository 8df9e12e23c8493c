//! Unified telemetry data model
//!
//! Defines the TelemetrySample structure every transport normalizes into.
//! Uses Option<T> for measurement fields so that samples recorded before a
//! sensor was added (or with a sensor offline) still deserialize; consumers
//! omit missing values instead of substituting zeros.

use crate::units::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One vehicle's instantaneous sensor reading.
///
/// `vehicle_id` and `timestamp` are identity and always present; the
/// timestamp is source-supplied, never client-generated, and is the only
/// ordering signal. A sample is immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub vehicle_id: String,

    /// When the reading was taken, per the source's clock
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kmph: Option<Kmph>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<Rpm>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_temp_c: Option<Celsius>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coolant_temp_c: Option<Celsius>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_wear_percent: Option<Percent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_voltage_v: Option<Volts>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_level_percent: Option<Percent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_status: Option<EngineStatus>,
}

impl TelemetrySample {
    /// Minimal sample with identity fields only; measurements start empty.
    pub fn new(vehicle_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            timestamp,
            speed_kmph: None,
            rpm: None,
            engine_temp_c: None,
            coolant_temp_c: None,
            brake_wear_percent: None,
            battery_voltage_v: None,
            fuel_level_percent: None,
            latitude: None,
            longitude: None,
            engine_status: None,
        }
    }
}

/// Engine state as reported by the vehicle.
///
/// Unknown strings map to `Unknown` so one unrecognized status value does
/// not reject an otherwise valid sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineStatus {
    On,
    Off,
    #[serde(other)]
    Unknown,
}

/// Registry entry for a vehicle, as served by the fleet backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub vin: String,
    pub owner_user_id: String,
    pub make: String,
    pub model: String,
    pub year: u16,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Connectivity of a telemetry source.
///
/// Driven by the source task, consumed for display (a connectivity badge).
/// Buffer correctness never depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}
