//! Client configuration
//!
//! Layered the usual way: built-in defaults, then an optional
//! `fleetpulse.toml` next to the working directory, then `FLEETPULSE_*`
//! environment overrides. The transport is a configuration choice, not a
//! per-view decision: push is canonical, poll is the fallback.

use crate::http::ApiClient;
use crate::poll::PollSource;
use crate::push::PushSource;
use fleetpulse_core::error::TelemetryError;
use fleetpulse_core::roles::Role;
use fleetpulse_core::source::TelemetrySource;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// HTTP base of the fleet backend
    pub base_url: String,
    pub role: Role,
    pub user_id: String,
    pub transport: Transport,
    /// Poll-mode cadence; must be >= the server's sampling cadence
    pub poll_interval_secs: u64,
    /// Rolling window capacity and history fetch limit
    pub history_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Push,
    Poll,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            role: Role::Customer,
            user_id: "demo-user".to_string(),
            transport: Transport::Push,
            poll_interval_secs: 5,
            history_depth: 50,
        }
    }
}

impl ClientConfig {
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("base_url", "http://localhost:8000")?
            .set_default("role", "CUSTOMER")?
            .set_default("user_id", "demo-user")?
            .set_default("transport", "push")?
            .set_default("poll_interval_secs", 5_i64)?
            .set_default("history_depth", 50_i64)?
            .add_source(config::File::with_name("fleetpulse").required(false))
            .add_source(config::Environment::with_prefix("FLEETPULSE"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn api_client(&self) -> Result<ApiClient, TelemetryError> {
        ApiClient::new(&self.base_url, self.role, self.user_id.clone())
    }

    /// Construct the configured telemetry source
    pub fn build_source(&self) -> Result<Arc<dyn TelemetrySource>, TelemetryError> {
        let api = self.api_client()?;
        Ok(match self.transport {
            Transport::Push => Arc::new(PushSource::new(api)),
            Transport::Poll => Arc::new(PollSource::new(
                api,
                Duration::from_secs(self.poll_interval_secs),
                self.history_depth,
            )),
        })
    }
}
