//! REST and WebSocket API routes

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fleetpulse_core::model::{TelemetrySample, Vehicle};
use fleetpulse_core::roles::{Capability, Role};
use serde::Deserialize;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

const ROLE_HEADER: &str = "x-role";
const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/telemetry", post(ingest_telemetry))
        .route("/telemetry/live/:vehicle_id", get(live_telemetry))
        .route("/telemetry/history/:vehicle_id", get(telemetry_history))
        .route("/user/vehicles", get(owned_vehicles))
        .route("/ws/telemetry/:vehicle_id", get(telemetry_socket))
        .route("/simulator/start/:vehicle_id", post(simulator_start))
        .route("/simulator/stop/:vehicle_id", post(simulator_stop))
        .route("/simulator/status/:vehicle_id", get(simulator_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve and gate the caller's role from the X-Role header.
///
/// The capability table in fleetpulse-core is the single source of truth;
/// no route carries its own role list.
fn require(headers: &HeaderMap, capability: Capability) -> Result<Role, (StatusCode, String)> {
    let value = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "missing X-Role header".to_string(),
        ))?;
    let role: Role = value
        .parse()
        .map_err(|_| (StatusCode::UNAUTHORIZED, format!("invalid role: {value}")))?;
    if !role.allows(capability) {
        return Err((StatusCode::FORBIDDEN, "access denied".to_string()));
    }
    Ok(role)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "RUNNING",
        "service": "fleetpulse-sim"
    }))
}

// === Telemetry endpoints ===

async fn ingest_telemetry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(sample): Json<TelemetrySample>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    require(&headers, Capability::IngestTelemetry)?;

    let vehicle_id = sample.vehicle_id.clone();
    state.record(sample).await;

    Ok(Json(serde_json::json!({
        "status": "queued",
        "vehicle_id": vehicle_id
    })))
}

async fn live_telemetry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<TelemetrySample>, (StatusCode, String)> {
    require(&headers, Capability::ViewTelemetry)?;

    match state.latest(&vehicle_id).await {
        Some(sample) => Ok(Json(sample)),
        None => Err((
            StatusCode::NOT_FOUND,
            "Live telemetry not available".to_string(),
        )),
    }
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn telemetry_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TelemetrySample>>, (StatusCode, String)> {
    require(&headers, Capability::ViewTelemetry)?;

    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(state.history(&vehicle_id, limit).await))
}

// === Vehicle registry ===

#[derive(Deserialize)]
struct VehiclesQuery {
    user_id: String,
}

async fn owned_vehicles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<VehiclesQuery>,
) -> Result<Json<Vec<Vehicle>>, (StatusCode, String)> {
    require(&headers, Capability::ViewTelemetry)?;
    Ok(Json(state.vehicles_owned_by(&query.user_id).await))
}

// === Push channel ===

#[derive(Deserialize)]
struct SocketQuery {
    user_id: Option<String>,
}

async fn telemetry_socket(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    Query(query): Query<SocketQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let user_id = query.user_id.unwrap_or_else(|| "demo-user".to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, vehicle_id, user_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, vehicle_id: String, user_id: String) {
    info!(vehicle = %vehicle_id, user = %user_id, "push session opened");
    let mut rx = state.subscribe(&vehicle_id).await;

    // Hand a fresh session the current reading so it does not start blank
    if let Some(latest) = state.latest(&vehicle_id).await {
        if send_sample(&mut socket, &latest).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // inbound data is not part of the protocol
                }
            }
            sample = rx.recv() => {
                match sample {
                    Ok(sample) => {
                        if send_sample(&mut socket, &sample).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(vehicle = %vehicle_id, skipped, "push session lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!(vehicle = %vehicle_id, user = %user_id, "push session closed");
}

async fn send_sample(socket: &mut WebSocket, sample: &TelemetrySample) -> Result<(), axum::Error> {
    match serde_json::to_string(sample) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize sample");
            Ok(())
        }
    }
}

// === Simulator control ===

async fn simulator_start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    require(&headers, Capability::ControlSimulator)?;

    let status = if state.start_simulator(&vehicle_id).await {
        "started"
    } else {
        "already_running"
    };
    Ok(Json(serde_json::json!({
        "status": status,
        "vehicle_id": vehicle_id
    })))
}

async fn simulator_stop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    require(&headers, Capability::ControlSimulator)?;

    let status = if state.stop_simulator(&vehicle_id).await {
        "stopped"
    } else {
        "not_running"
    };
    Ok(Json(serde_json::json!({
        "status": status,
        "vehicle_id": vehicle_id
    })))
}

async fn simulator_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(vehicle_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    require(&headers, Capability::ControlSimulator)?;

    let running = state.simulator_running(&vehicle_id).await;
    Ok(Json(serde_json::json!({
        "vehicle_id": vehicle_id,
        "running": running
    })))
}
