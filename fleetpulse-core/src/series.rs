//! Chart-ready series derived from a buffer snapshot
//!
//! Projection is a pure function of the snapshot: the same input always
//! yields structurally equal output, so re-renders never jitter existing
//! axis labels. A sample missing an optional field contributes no point to
//! that series — substituting zero would corrupt the chart scale.

use crate::model::TelemetrySample;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SPEED: &str = "speed";
pub const RPM: &str = "rpm";
pub const ENGINE_TEMP: &str = "engine_temp";
pub const COOLANT_TEMP: &str = "coolant_temp";
pub const BATTERY_VOLTAGE: &str = "battery_voltage";
pub const FUEL_LEVEL: &str = "fuel_level";

/// One plotted point: a stable `%H:%M:%S` label and a numeric value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: f64,
}

/// Named series in a fixed name order, each ordered as the snapshot was
pub type SeriesSet = BTreeMap<&'static str, Vec<SeriesPoint>>;

/// Map a buffer snapshot (oldest-first) into named numeric series.
///
/// Every series is present in the output, possibly empty, so chart
/// consumers can bind legends without existence checks.
pub fn project(samples: &[TelemetrySample]) -> SeriesSet {
    let mut series: SeriesSet = BTreeMap::new();
    for name in [SPEED, RPM, ENGINE_TEMP, COOLANT_TEMP, BATTERY_VOLTAGE, FUEL_LEVEL] {
        series.insert(name, Vec::new());
    }

    for sample in samples {
        let label = sample.timestamp.format("%H:%M:%S").to_string();
        let mut point = |name: &'static str, value: Option<f64>| {
            if let Some(y) = value {
                series.entry(name).or_default().push(SeriesPoint {
                    x: label.clone(),
                    y,
                });
            }
        };

        point(SPEED, sample.speed_kmph.map(|v| v.0));
        point(RPM, sample.rpm.map(|v| v.0));
        point(ENGINE_TEMP, sample.engine_temp_c.map(|v| v.0));
        point(COOLANT_TEMP, sample.coolant_temp_c.map(|v| v.0));
        point(BATTERY_VOLTAGE, sample.battery_voltage_v.map(|v| v.0));
        point(FUEL_LEVEL, sample.fuel_level_percent.map(|v| v.0));
    }

    series
}
