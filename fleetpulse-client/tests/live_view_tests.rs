//! End-to-end tests for the telemetry sources and the live view model
//!
//! Each test spins up the simulator backend in-process on an ephemeral port
//! and drives the real transports against it.

use chrono::{DateTime, TimeZone, Utc};
use fleetpulse_client::{ApiClient, LiveTelemetryView, PollSource, PushSource, VehicleSelector};
use fleetpulse_core::model::{ConnectionState, TelemetrySample, Vehicle};
use fleetpulse_core::roles::Role;
use fleetpulse_core::units::Kmph;
use fleetpulse_sim::{api, state::AppState};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_backend() -> (AppState, String) {
    let state = AppState::new();
    let app = api::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, format!("http://{addr}"))
}

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn sample(vehicle: &str, secs: i64, speed: f64) -> TelemetrySample {
    let mut s = TelemetrySample::new(vehicle, ts(secs));
    s.speed_kmph = Some(Kmph(speed));
    s
}

fn client(base: &str, role: Role) -> ApiClient {
    ApiClient::new(base, role, "user-1").unwrap()
}

async fn next_within(view: &mut LiveTelemetryView, secs: u64) -> bool {
    tokio::time::timeout(Duration::from_secs(secs), view.next_change())
        .await
        .unwrap_or(false)
}

// ==================== ApiClient ====================

#[tokio::test]
async fn test_live_endpoint_empty_result_is_none() {
    let (_state, base) = spawn_backend().await;
    let api = client(&base, Role::Customer);

    let live = api.live("VIN-FRESH").await.unwrap();
    assert!(live.is_none(), "404 must map to Ok(None), not an error");
}

#[tokio::test]
async fn test_history_endpoint_returns_newest_first() {
    let (state, base) = spawn_backend().await;
    for i in 1..=5 {
        state.record(sample("VIN-H", i, i as f64)).await;
    }

    let api = client(&base, Role::Customer);
    let window = api.history("VIN-H", 3).await.unwrap();
    let times: Vec<i64> = window.iter().map(|s| s.timestamp.timestamp()).collect();
    assert_eq!(times, vec![5, 4, 3]);
}

#[tokio::test]
async fn test_simulator_control_round_trip() {
    let (_state, base) = spawn_backend().await;
    let api = client(&base, Role::ServiceCenter);

    api.simulator_start("VIN-CTL").await.unwrap();
    let status = api.simulator_status("VIN-CTL").await.unwrap();
    assert!(status.running);

    api.simulator_stop("VIN-CTL").await.unwrap();
    let status = api.simulator_status("VIN-CTL").await.unwrap();
    assert!(!status.running);
}

// ==================== Push transport ====================

#[tokio::test]
async fn test_push_source_delivers_samples_in_order() {
    let (state, base) = spawn_backend().await;
    state.record(sample("VIN-P", 1, 10.0)).await;

    let source = Arc::new(PushSource::new(client(&base, Role::Customer)));
    let mut view = LiveTelemetryView::new(source, 50);
    view.select("VIN-P").await.unwrap();

    // The session replays the current reading on connect
    assert!(next_within(&mut view, 5).await, "no initial sample arrived");
    assert_eq!(view.connection_state(), ConnectionState::Connected);

    state.record(sample("VIN-P", 2, 20.0)).await;
    assert!(next_within(&mut view, 5).await, "no pushed sample arrived");

    let times: Vec<i64> = view
        .snapshot()
        .iter()
        .map(|s| s.timestamp.timestamp())
        .collect();
    assert_eq!(times, vec![1, 2]);
    assert!(view.has_signal());

    view.close().await;
}

#[tokio::test]
async fn test_push_source_switching_vehicles_discards_buffer() {
    let (state, base) = spawn_backend().await;
    state.record(sample("VIN-A", 1, 10.0)).await;
    state.record(sample("VIN-B", 2, 20.0)).await;

    let source = Arc::new(PushSource::new(client(&base, Role::Customer)));
    let mut view = LiveTelemetryView::new(source, 50);

    view.select("VIN-A").await.unwrap();
    assert!(next_within(&mut view, 5).await);
    assert!(view.has_signal());

    view.select("VIN-B").await.unwrap();
    assert!(!view.has_signal(), "switch must start from an empty buffer");
    assert!(next_within(&mut view, 5).await);

    let snapshot = view.snapshot();
    assert!(!snapshot.is_empty());
    assert!(
        snapshot.iter().all(|s| s.vehicle_id == "VIN-B"),
        "no VIN-A sample may survive the switch"
    );

    view.close().await;
}

#[tokio::test]
async fn test_push_source_drops_malformed_message_and_continues() {
    use axum::extract::ws::{Message, WebSocketUpgrade};
    use axum::extract::Path;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    // Backend variant that wedges a malformed frame between two valid ones
    async fn socket_route(
        Path(vehicle_id): Path<String>,
        ws: WebSocketUpgrade,
    ) -> impl IntoResponse {
        ws.on_upgrade(move |mut socket| async move {
            let first = serde_json::to_string(&sample(&vehicle_id, 1, 10.0)).unwrap();
            let second = serde_json::to_string(&sample(&vehicle_id, 2, 20.0)).unwrap();
            let _ = socket.send(Message::Text(first)).await;
            let _ = socket
                .send(Message::Text(r#"{"not": "a sample"}"#.to_string()))
                .await;
            let _ = socket.send(Message::Text(second)).await;
            // Hold the session open until the client tears it down
            while let Some(Ok(_)) = socket.recv().await {}
        })
    }

    let app = Router::new().route("/ws/telemetry/:vehicle_id", get(socket_route));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = client(&format!("http://{addr}"), Role::Customer);
    let source = Arc::new(PushSource::new(api));
    let mut view = LiveTelemetryView::new(source, 50);
    view.select("VIN-M").await.unwrap();

    // Exactly the two valid samples arrive, in arrival order
    assert!(next_within(&mut view, 5).await);
    assert!(next_within(&mut view, 5).await);

    let times: Vec<i64> = view
        .snapshot()
        .iter()
        .map(|s| s.timestamp.timestamp())
        .collect();
    assert_eq!(times, vec![1, 2]);

    view.close().await;
}

// ==================== Poll transport ====================

#[tokio::test]
async fn test_poll_source_replaces_window_wholesale() {
    let (state, base) = spawn_backend().await;
    for i in 1..=5 {
        state.record(sample("VIN-Q", i, i as f64)).await;
    }

    let source = Arc::new(PollSource::new(
        client(&base, Role::Customer),
        Duration::from_millis(200),
        50,
    ));
    let mut view = LiveTelemetryView::new(source, 50);
    view.select("VIN-Q").await.unwrap();

    assert!(next_within(&mut view, 5).await, "no poll cycle completed");

    let times: Vec<i64> = view
        .snapshot()
        .iter()
        .map(|s| s.timestamp.timestamp())
        .collect();
    assert_eq!(times, vec![1, 2, 3, 4, 5], "window must be oldest-first");
    assert_eq!(view.connection_state(), ConnectionState::Connected);

    // A newer reading shows up on a later cycle
    state.record(sample("VIN-Q", 6, 60.0)).await;
    let grew = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            view.next_change().await;
            if view.snapshot().len() == 6 {
                break;
            }
        }
    })
    .await;
    assert!(grew.is_ok(), "poll window never picked up the new sample");

    view.close().await;
}

#[tokio::test]
async fn test_poll_source_degrades_on_transport_error() {
    // Nothing listens here; every cycle fails
    let api = client("http://127.0.0.1:9", Role::Customer);
    let source = Arc::new(PollSource::new(api, Duration::from_millis(100), 50));
    let mut view = LiveTelemetryView::new(source, 50);
    view.select("VIN-DEAD").await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(view.pump(), 0, "failed cycles must not emit events");
    assert_eq!(view.connection_state(), ConnectionState::Disconnected);
    assert!(!view.has_signal());

    view.close().await;
}

// ==================== Vehicle selector ====================

#[tokio::test]
async fn test_selector_defaults_to_first_owned_vehicle() {
    let (state, base) = spawn_backend().await;
    let now = Utc::now();
    for vin in ["VIN-FIRST", "VIN-SECOND"] {
        state
            .register_vehicle(Vehicle {
                vin: vin.to_string(),
                owner_user_id: "user-1".to_string(),
                make: "Aurora".to_string(),
                model: "GT".to_string(),
                year: 2023,
                created_at: now,
                last_seen_at: now,
            })
            .await;
    }

    let selector = VehicleSelector::new(client(&base, Role::Customer));
    let chosen = selector.resolve(None).await.unwrap();
    assert_eq!(chosen.as_deref(), Some("VIN-FIRST"));
}

#[tokio::test]
async fn test_selector_empty_fleet_resolves_to_none() {
    let (_state, base) = spawn_backend().await;
    let selector = VehicleSelector::new(client(&base, Role::Customer));
    let chosen = selector.resolve(None).await.unwrap();
    assert_eq!(chosen, None);
}
