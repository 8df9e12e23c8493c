//! Typed REST client for the fleet backend
//!
//! Every request carries the caller's role in the `X-Role` header; the
//! client forwards it and never interprets it — authorization is entirely
//! the backend's responsibility.

use fleetpulse_core::error::TelemetryError;
use fleetpulse_core::model::{TelemetrySample, Vehicle};
use fleetpulse_core::roles::Role;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

const ROLE_HEADER: &str = "X-Role";

/// HTTP client bound to one backend, one caller role and one user identity
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    role: Role,
    user_id: String,
}

/// Simulator run state as reported by the control endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorStatus {
    pub vehicle_id: String,
    pub running: bool,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        role: Role,
        user_id: impl Into<String>,
    ) -> Result<Self, TelemetryError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TelemetryError::transport(format!("invalid base url: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            role,
            user_id: user_id.into(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TelemetryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TelemetryError::transport("base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Derive the push-channel URL for one vehicle from the HTTP base
    /// (`http` → `ws`, `https` → `wss`).
    pub fn ws_url(&self, vehicle_id: &str) -> Result<Url, TelemetryError> {
        let mut url = self.endpoint(&["ws", "telemetry", vehicle_id])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| TelemetryError::transport("cannot derive websocket scheme"))?;
        url.query_pairs_mut().append_pair("user_id", &self.user_id);
        Ok(url)
    }

    /// Latest sample for a vehicle; `Ok(None)` when no live signal exists yet
    pub async fn live(&self, vehicle_id: &str) -> Result<Option<TelemetrySample>, TelemetryError> {
        let url = self.endpoint(&["telemetry", "live", vehicle_id])?;
        let response = self
            .http
            .get(url)
            .header(ROLE_HEADER, self.role.header_value())
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let sample = response
                    .json::<TelemetrySample>()
                    .await
                    .map_err(|e| TelemetryError::malformed(e.to_string()))?;
                Ok(Some(sample))
            }
            status => Err(TelemetryError::transport(format!(
                "live endpoint returned {status}"
            ))),
        }
    }

    /// Recent history window for a vehicle, newest-first as served
    pub async fn history(
        &self,
        vehicle_id: &str,
        limit: usize,
    ) -> Result<Vec<TelemetrySample>, TelemetryError> {
        let mut url = self.endpoint(&["telemetry", "history", vehicle_id])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let response = self
            .http
            .get(url)
            .header(ROLE_HEADER, self.role.header_value())
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(TelemetryError::transport(format!(
                "history endpoint returned {}",
                response.status()
            )));
        }
        response
            .json::<Vec<TelemetrySample>>()
            .await
            .map_err(|e| TelemetryError::malformed(e.to_string()))
    }

    /// Vehicles owned by this client's user
    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, TelemetryError> {
        let mut url = self.endpoint(&["user", "vehicles"])?;
        url.query_pairs_mut().append_pair("user_id", &self.user_id);
        let response = self
            .http
            .get(url)
            .header(ROLE_HEADER, self.role.header_value())
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(TelemetryError::transport(format!(
                "vehicles endpoint returned {}",
                response.status()
            )));
        }
        response
            .json::<Vec<Vehicle>>()
            .await
            .map_err(|e| TelemetryError::malformed(e.to_string()))
    }

    /// Publish one sample into the ingest endpoint (OEM data path)
    pub async fn ingest(&self, sample: &TelemetrySample) -> Result<(), TelemetryError> {
        let url = self.endpoint(&["telemetry"])?;
        let response = self
            .http
            .post(url)
            .header(ROLE_HEADER, self.role.header_value())
            .json(sample)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(TelemetryError::transport(format!(
                "ingest endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Fire-and-forget start signal for the demo drive cycle
    pub async fn simulator_start(&self, vehicle_id: &str) -> Result<(), TelemetryError> {
        self.simulator_signal("start", vehicle_id).await
    }

    /// Fire-and-forget stop signal for the demo drive cycle
    pub async fn simulator_stop(&self, vehicle_id: &str) -> Result<(), TelemetryError> {
        self.simulator_signal("stop", vehicle_id).await
    }

    pub async fn simulator_status(
        &self,
        vehicle_id: &str,
    ) -> Result<SimulatorStatus, TelemetryError> {
        let url = self.endpoint(&["simulator", "status", vehicle_id])?;
        let response = self
            .http
            .get(url)
            .header(ROLE_HEADER, self.role.header_value())
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(TelemetryError::transport(format!(
                "simulator status returned {}",
                response.status()
            )));
        }
        response
            .json::<SimulatorStatus>()
            .await
            .map_err(|e| TelemetryError::malformed(e.to_string()))
    }

    async fn simulator_signal(&self, action: &str, vehicle_id: &str) -> Result<(), TelemetryError> {
        let url = self.endpoint(&["simulator", action, vehicle_id])?;
        let response = self
            .http
            .post(url)
            .header(ROLE_HEADER, self.role.header_value())
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(TelemetryError::transport(format!(
                "simulator {action} returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> TelemetryError {
    TelemetryError::transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Role::Customer, "user-1").unwrap()
    }

    #[test]
    fn test_ws_url_from_http_base() {
        let url = client("http://localhost:8000").ws_url("VIN-1").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/telemetry/VIN-1?user_id=user-1");
    }

    #[test]
    fn test_ws_url_from_https_base_uses_wss() {
        let url = client("https://fleet.example.com").ws_url("VIN-1").unwrap();
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn test_ws_url_escapes_vehicle_id() {
        let url = client("http://localhost:8000").ws_url("VIN 1/A").unwrap();
        assert!(url.path().contains("VIN%201%2FA"));
    }

    #[test]
    fn test_invalid_base_url_is_transport_error() {
        let err = ApiClient::new("not a url", Role::Customer, "u").unwrap_err();
        assert!(matches!(err, TelemetryError::Transport { .. }));
    }
}
