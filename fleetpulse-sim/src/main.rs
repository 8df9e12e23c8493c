//! FleetPulse Simulator Backend
//!
//! Local fleet telemetry service: live/history endpoints, per-vehicle
//! push channel and drive-cycle simulator control.

use anyhow::Result;
use chrono::Utc;
use fleetpulse_core::model::Vehicle;
use fleetpulse_sim::{api, state};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting FleetPulse simulator backend");

    // Create application state with a small demo fleet
    let state = state::AppState::new();
    seed_demo_fleet(&state).await;

    // Build the router
    let app = api::create_router(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn seed_demo_fleet(state: &state::AppState) {
    let now = Utc::now();
    let fleet = [
        ("DEMO-VEHICLE-001", "demo-user", "Aurora", "GT", 2023),
        ("DEMO-VEHICLE-002", "demo-user", "Aurora", "Tour", 2022),
        ("DEMO-VEHICLE-003", "svc-demo", "Meridian", "X1", 2024),
    ];
    for (vin, owner, make, model, year) in fleet {
        state
            .register_vehicle(Vehicle {
                vin: vin.to_string(),
                owner_user_id: owner.to_string(),
                make: make.to_string(),
                model: model.to_string(),
                year,
                created_at: now,
                last_seen_at: now,
            })
            .await;
    }
}
