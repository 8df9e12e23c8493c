//! Type-safe wrappers for telemetry measurements
//!
//! Newtype wrappers around f64 to prevent unit confusion between fields
//! (a speed is not a temperature even when both are "just numbers").
//!
//! All unit types serialize as bare numbers rounded to 2 decimal places so
//! the wire format stays identical to the backend contract.

use serde::{Deserialize, Serialize};

/// Round f64 to 2 decimal places for compact JSON serialization
fn round2<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 100.0).round() / 100.0)
}

/// Kilometers per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Kmph(#[serde(serialize_with = "round2")] pub f64);

/// Revolutions per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rpm(#[serde(serialize_with = "round2")] pub f64);

/// Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Celsius(#[serde(serialize_with = "round2")] pub f64);

/// Volts (electrical)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Volts(#[serde(serialize_with = "round2")] pub f64);

/// Percentage (0.0 to 100.0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Percent(#[serde(serialize_with = "round2")] pub f64);

impl Percent {
    /// Create a new percentage, clamping to [0.0, 100.0]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 100.0))
    }

    /// Get as a fraction (0.0 to 1.0)
    pub fn as_fraction(&self) -> f64 {
        self.0 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_clamp() {
        assert_eq!(Percent::new(130.0).0, 100.0);
        assert_eq!(Percent::new(-5.0).0, 0.0);
        assert_eq!(Percent::new(42.5).0, 42.5);
    }

    #[test]
    fn test_percent_as_fraction() {
        let p = Percent::new(75.0);
        assert!((p.as_fraction() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_units_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&Kmph(62.5)).unwrap(), "62.5");
        assert_eq!(serde_json::to_string(&Rpm(3150.0)).unwrap(), "3150.0");
        assert_eq!(serde_json::to_string(&Volts(13.456)).unwrap(), "13.46");
    }

    #[test]
    fn test_units_deserialize_from_bare_numbers() {
        let v: Celsius = serde_json::from_str("92.4").unwrap();
        assert_eq!(v, Celsius(92.4));
    }
}
