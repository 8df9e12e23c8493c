//! Caller roles and the capability table
//!
//! One lookup table maps each role to the operations it may perform. Both
//! the client (deciding which views to drive) and the simulator service
//! (gating endpoints) consult this table, so a grant changes in exactly one
//! place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller classification forwarded as the `X-Role` request header.
///
/// The client never interprets a role beyond the capability lookup;
/// authorization is the backend's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    ServiceCenter,
    OemAdmin,
    OemAnalyst,
}

/// Operations a role may perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read live/history telemetry for a vehicle
    ViewTelemetry,
    /// Has an owned-vehicle list to default the selector from
    OwnedVehicles,
    /// Publish samples into the ingest endpoint
    IngestTelemetry,
    /// Start/stop the demo drive-cycle simulator
    ControlSimulator,
}

/// Allowed operations per role.
///
/// Grants mirror the backend's route guards: every role reads telemetry and
/// may drive the demo simulator, only OEM roles ingest, and only customers
/// carry an owned-vehicle list.
pub fn capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::Customer => &[ViewTelemetry, OwnedVehicles, ControlSimulator],
        Role::ServiceCenter => &[ViewTelemetry, ControlSimulator],
        Role::OemAdmin => &[ViewTelemetry, IngestTelemetry, ControlSimulator],
        Role::OemAnalyst => &[ViewTelemetry, IngestTelemetry, ControlSimulator],
    }
}

impl Role {
    pub fn allows(self, capability: Capability) -> bool {
        capabilities(self).contains(&capability)
    }

    /// Wire spelling used in the `X-Role` header
    pub fn header_value(self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::ServiceCenter => "SERVICE_CENTER",
            Role::OemAdmin => "OEM_ADMIN",
            Role::OemAnalyst => "OEM_ANALYST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "SERVICE_CENTER" => Ok(Role::ServiceCenter),
            "OEM_ADMIN" => Ok(Role::OemAdmin),
            "OEM_ANALYST" => Ok(Role::OemAnalyst),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_views_telemetry() {
        for role in [
            Role::Customer,
            Role::ServiceCenter,
            Role::OemAdmin,
            Role::OemAnalyst,
        ] {
            assert!(role.allows(Capability::ViewTelemetry), "{role} cannot view");
        }
    }

    #[test]
    fn test_only_oem_roles_ingest() {
        assert!(Role::OemAdmin.allows(Capability::IngestTelemetry));
        assert!(Role::OemAnalyst.allows(Capability::IngestTelemetry));
        assert!(!Role::Customer.allows(Capability::IngestTelemetry));
        assert!(!Role::ServiceCenter.allows(Capability::IngestTelemetry));
    }

    #[test]
    fn test_only_customer_has_owned_vehicles() {
        assert!(Role::Customer.allows(Capability::OwnedVehicles));
        assert!(!Role::ServiceCenter.allows(Capability::OwnedVehicles));
        assert!(!Role::OemAdmin.allows(Capability::OwnedVehicles));
    }

    #[test]
    fn test_header_value_round_trips_through_from_str() {
        for role in [
            Role::Customer,
            Role::ServiceCenter,
            Role::OemAdmin,
            Role::OemAnalyst,
        ] {
            assert_eq!(role.header_value().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!("MECHANIC".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&Role::ServiceCenter).unwrap(),
            "\"SERVICE_CENTER\""
        );
        let role: Role = serde_json::from_str("\"OEM_ANALYST\"").unwrap();
        assert_eq!(role, Role::OemAnalyst);
    }
}
