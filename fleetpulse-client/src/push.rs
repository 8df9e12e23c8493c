//! WebSocket push source
//!
//! Opens one connection per subscription, keyed by vehicle id and caller
//! identity. Each inbound text message parses as one sample; a malformed
//! message is logged and dropped without ending the stream. A closed or
//! failed connection reconnects with capped exponential backoff so a
//! dashboard never sits silently disconnected.

use crate::http::ApiClient;
use async_trait::async_trait;
use fleetpulse_core::error::TelemetryError;
use fleetpulse_core::model::{ConnectionState, TelemetrySample};
use fleetpulse_core::source::{SourceEvent, Subscription, TelemetrySource};
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Push-mode telemetry source over the per-vehicle WebSocket channel
pub struct PushSource {
    api: ApiClient,
}

impl PushSource {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TelemetrySource for PushSource {
    async fn subscribe(&self, vehicle_id: &str) -> Result<Subscription, TelemetryError> {
        let url = self.api.ws_url(vehicle_id)?;
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_feed(
            url,
            vehicle_id.to_string(),
            event_tx,
            state_tx,
            cancel.clone(),
        ));
        Ok(Subscription::new(event_rx, state_rx, cancel, task))
    }
}

/// Connect / read / reconnect loop for one subscription
async fn run_feed(
    url: Url,
    vehicle_id: String,
    events: mpsc::Sender<SourceEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if cancel.is_cancelled() {
            break;
        }
        let _ = state.send(ConnectionState::Connecting);

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((stream, _response)) => {
                info!(vehicle = %vehicle_id, "telemetry stream connected");
                let _ = state.send(ConnectionState::Connected);
                backoff = INITIAL_BACKOFF;

                read_messages(stream, &vehicle_id, &events, &cancel).await;

                let _ = state.send(ConnectionState::Disconnected);
                if cancel.is_cancelled() {
                    break;
                }
                warn!(
                    vehicle = %vehicle_id,
                    "telemetry stream closed, reconnecting in {:?}", backoff
                );
            }
            Err(e) => {
                let _ = state.send(ConnectionState::Disconnected);
                warn!(
                    vehicle = %vehicle_id,
                    error = %e,
                    "telemetry stream connect failed, retrying in {:?}", backoff
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(backoff) => {}
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }

    let _ = state.send(ConnectionState::Disconnected);
}

/// Read one connection until it closes, errors or is cancelled
async fn read_messages<S>(
    mut stream: WebSocketStream<S>,
    vehicle_id: &str,
    events: &mpsc::Sender<SourceEvent>,
    cancel: &CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return;
            }
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => match decode_sample(&text) {
                Ok(sample) => {
                    if events.send(SourceEvent::Sample(sample)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(vehicle = %vehicle_id, error = %e, "dropping malformed sample");
                }
            },
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => {} // ping/pong/binary: not part of the sample stream
            Some(Err(e)) => {
                warn!(vehicle = %vehicle_id, error = %e, "telemetry stream read error");
                return;
            }
        }
    }
}

fn decode_sample(text: &str) -> Result<TelemetrySample, TelemetryError> {
    serde_json::from_str(text).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_sample() {
        let json = r#"{"vehicle_id":"VIN-1","timestamp":"2024-01-15T10:30:00Z","speed_kmph":61.2}"#;
        let sample = decode_sample(json).unwrap();
        assert_eq!(sample.vehicle_id, "VIN-1");
    }

    #[test]
    fn test_decode_malformed_payload_is_malformed_sample() {
        let err = decode_sample("{\"speed_kmph\": 61.2}").unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedSample { .. }));

        let err = decode_sample("not json at all").unwrap_err();
        assert!(matches!(err, TelemetryError::MalformedSample { .. }));
    }
}
