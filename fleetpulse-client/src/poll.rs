//! Interval poll source
//!
//! Fallback transport for environments without the push channel. Each tick
//! issues two independent requests: the recent history window, delivered as
//! a wholesale `Replace`, and the current live sample, delivered as a
//! `Sample` only when strictly fresher than everything already delivered.
//! The poll cadence should be at least the server's sampling cadence or the
//! window will show visible gaps.

use crate::http::ApiClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetpulse_core::error::TelemetryError;
use fleetpulse_core::model::ConnectionState;
use fleetpulse_core::source::{SourceEvent, Subscription, TelemetrySource};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Poll-mode telemetry source over the live and history endpoints
pub struct PollSource {
    api: ApiClient,
    interval: Duration,
    history_limit: usize,
}

impl PollSource {
    pub fn new(api: ApiClient, interval: Duration, history_limit: usize) -> Self {
        Self {
            api,
            interval,
            history_limit,
        }
    }
}

#[async_trait]
impl TelemetrySource for PollSource {
    async fn subscribe(&self, vehicle_id: &str) -> Result<Subscription, TelemetryError> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_poll(
            self.api.clone(),
            vehicle_id.to_string(),
            self.interval,
            self.history_limit,
            event_tx,
            state_tx,
            cancel.clone(),
        ));
        Ok(Subscription::new(event_rx, state_rx, cancel, task))
    }
}

async fn run_poll(
    api: ApiClient,
    vehicle_id: String,
    interval: Duration,
    history_limit: usize,
    events: mpsc::Sender<SourceEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_live: Option<DateTime<Utc>> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if events.is_closed() {
            break;
        }

        match poll_cycle(&api, &vehicle_id, history_limit, &mut last_live, &events).await {
            Ok(()) => {
                let _ = state.send(ConnectionState::Connected);
            }
            Err(e) => {
                // Degrade to the last known window; the next tick retries.
                let _ = state.send(ConnectionState::Disconnected);
                warn!(vehicle = %vehicle_id, error = %e, "poll cycle failed");
            }
        }
    }

    let _ = state.send(ConnectionState::Disconnected);
}

/// One fetch round: history replaces the window, a fresher live sample
/// appends on top of it.
async fn poll_cycle(
    api: &ApiClient,
    vehicle_id: &str,
    history_limit: usize,
    last_live: &mut Option<DateTime<Utc>>,
    events: &mpsc::Sender<SourceEvent>,
) -> Result<(), TelemetryError> {
    let history = api.history(vehicle_id, history_limit).await?;
    let newest_in_history = history.iter().map(|s| s.timestamp).max();
    let _ = events.send(SourceEvent::Replace(history)).await;

    // An absent live sample is the ordinary "no live signal" state.
    if let Some(sample) = api.live(vehicle_id).await? {
        let fresher_than_history = newest_in_history.is_none_or(|t| sample.timestamp > t);
        let fresher_than_last = last_live.is_none_or(|t| sample.timestamp > t);
        if fresher_than_history && fresher_than_last {
            *last_live = Some(sample.timestamp);
            let _ = events.send(SourceEvent::Sample(sample)).await;
        }
    }

    Ok(())
}
