//! Failure taxonomy for telemetry retrieval
//!
//! Every failure is contained inside the source that produced it: transport
//! problems degrade the connection state and retry, malformed payloads drop
//! the single offending message, and an absent live sample is an ordinary
//! empty state. Nothing here ever propagates into a consumer's render path
//! as a panic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Connection refused, timeout, or a non-2xx response
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// Payload failed to parse or validate against the sample shape
    #[error("malformed telemetry sample: {detail}")]
    MalformedSample { detail: String },

    /// No live sample exists yet (fresh vehicle, simulator not started)
    #[error("no live telemetry available")]
    EmptyResult,
}

impl TelemetryError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedSample {
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_malformed() {
        let err = serde_json::from_str::<crate::model::TelemetrySample>("not json").unwrap_err();
        let mapped: TelemetryError = err.into();
        assert!(matches!(mapped, TelemetryError::MalformedSample { .. }));
    }

    #[test]
    fn test_display_messages() {
        let err = TelemetryError::transport("connection refused");
        assert_eq!(err.to_string(), "transport failure: connection refused");
        assert_eq!(
            TelemetryError::EmptyResult.to_string(),
            "no live telemetry available"
        );
    }
}
