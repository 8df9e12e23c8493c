//! Active-vehicle resolution
//!
//! Decides which vehicle the live view binds to: a route-supplied id is
//! authoritative; otherwise roles that carry an owned-vehicle list default
//! to its first entry; every other role falls back to the fixed demo
//! placeholder so the rest of the view has something to request telemetry
//! for. Re-resolution happens when role or the owned list changes — never
//! because the buffer changed.

use crate::http::ApiClient;
use fleetpulse_core::error::TelemetryError;
use fleetpulse_core::model::Vehicle;
use fleetpulse_core::roles::Capability;
use tracing::debug;

/// Placeholder id for roles without an owned-fleet concept
pub const DEFAULT_VEHICLE_ID: &str = "DEMO-VEHICLE-001";

pub struct VehicleSelector {
    api: ApiClient,
}

impl VehicleSelector {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Resolve the active vehicle id.
    ///
    /// `Ok(None)` means the caller owns an empty fleet; the view should
    /// stay idle rather than request telemetry for a guessed id.
    pub async fn resolve(
        &self,
        route_vehicle: Option<&str>,
    ) -> Result<Option<String>, TelemetryError> {
        if let Some(id) = route_vehicle.filter(|id| !id.is_empty()) {
            return Ok(Some(id.to_string()));
        }

        if self.api.role().allows(Capability::OwnedVehicles) {
            let vehicles = self.api.vehicles().await?;
            let chosen = first_owned(&vehicles);
            if chosen.is_none() {
                debug!(user = %self.api.user_id(), "no owned vehicles to select from");
            }
            return Ok(chosen);
        }

        Ok(Some(DEFAULT_VEHICLE_ID.to_string()))
    }
}

fn first_owned(vehicles: &[Vehicle]) -> Option<String> {
    vehicles.first().map(|v| v.vin.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fleetpulse_core::roles::Role;

    fn selector(role: Role) -> VehicleSelector {
        // Unroutable base: these tests never reach the network
        VehicleSelector::new(ApiClient::new("http://127.0.0.1:1", role, "user-1").unwrap())
    }

    fn vehicle(vin: &str) -> Vehicle {
        Vehicle {
            vin: vin.to_string(),
            owner_user_id: "user-1".to_string(),
            make: "Aurora".to_string(),
            model: "GT".to_string(),
            year: 2023,
            created_at: Utc::now(),
            last_seen_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_route_parameter_is_authoritative() {
        // Even for the customer role, a route id skips the list fetch
        let chosen = selector(Role::Customer)
            .resolve(Some("VIN-ROUTE"))
            .await
            .unwrap();
        assert_eq!(chosen.as_deref(), Some("VIN-ROUTE"));
    }

    #[tokio::test]
    async fn test_empty_route_parameter_is_ignored() {
        let chosen = selector(Role::OemAdmin).resolve(Some("")).await.unwrap();
        assert_eq!(chosen.as_deref(), Some(DEFAULT_VEHICLE_ID));
    }

    #[tokio::test]
    async fn test_roles_without_fleet_fall_back_to_placeholder() {
        for role in [Role::ServiceCenter, Role::OemAdmin, Role::OemAnalyst] {
            let chosen = selector(role).resolve(None).await.unwrap();
            assert_eq!(chosen.as_deref(), Some(DEFAULT_VEHICLE_ID));
        }
    }

    #[test]
    fn test_first_owned_takes_list_head() {
        let vehicles = vec![vehicle("VIN-A"), vehicle("VIN-B")];
        assert_eq!(first_owned(&vehicles).as_deref(), Some("VIN-A"));
        assert_eq!(first_owned(&[]), None);
    }
}
