//! Live telemetry view model
//!
//! Binds the selected vehicle to a telemetry source, owns the bounded
//! history for that vehicle, and derives chart-ready series from it. The
//! buffer belongs to exactly one view: selecting a different vehicle tears
//! the previous subscription down deterministically and starts from an
//! empty window — buffers are replaced wholesale, never merged.

use fleetpulse_core::buffer::HistoryBuffer;
use fleetpulse_core::error::TelemetryError;
use fleetpulse_core::model::{ConnectionState, TelemetrySample};
use fleetpulse_core::series::{self, SeriesSet};
use fleetpulse_core::source::{SourceEvent, Subscription, TelemetrySource};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LiveTelemetryView {
    source: Arc<dyn TelemetrySource>,
    capacity: usize,
    active: Option<ActiveFeed>,
}

struct ActiveFeed {
    vehicle_id: String,
    subscription: Subscription,
    buffer: HistoryBuffer,
}

impl LiveTelemetryView {
    pub fn new(source: Arc<dyn TelemetrySource>, capacity: usize) -> Self {
        Self {
            source,
            capacity,
            active: None,
        }
    }

    pub fn vehicle_id(&self) -> Option<&str> {
        self.active.as_ref().map(|feed| feed.vehicle_id.as_str())
    }

    /// Bind the view to a vehicle.
    ///
    /// Any previous subscription is closed and awaited before the new one
    /// is established — no overlap, no leaked timers or sockets. Selecting
    /// the already-active vehicle is a no-op.
    pub async fn select(&mut self, vehicle_id: &str) -> Result<(), TelemetryError> {
        if self.vehicle_id() == Some(vehicle_id) {
            return Ok(());
        }
        self.close().await;

        let subscription = self.source.subscribe(vehicle_id).await?;
        self.active = Some(ActiveFeed {
            vehicle_id: vehicle_id.to_string(),
            subscription,
            buffer: HistoryBuffer::new(self.capacity),
        });
        Ok(())
    }

    /// Teardown path for view unmount; idempotent
    pub async fn close(&mut self) {
        if let Some(feed) = self.active.take() {
            feed.subscription.close().await;
        }
    }

    /// Await one event from the active feed and apply it.
    ///
    /// Returns `false` when no feed is active or the feed has shut down.
    pub async fn next_change(&mut self) -> bool {
        let Some(feed) = self.active.as_mut() else {
            return false;
        };
        match feed.subscription.recv().await {
            Some(event) => {
                feed.apply(event);
                true
            }
            None => false,
        }
    }

    /// Apply every pending event without blocking; returns how many
    pub fn pump(&mut self) -> usize {
        let Some(feed) = self.active.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        while let Some(event) = feed.subscription.try_recv() {
            feed.apply(event);
            applied += 1;
        }
        applied
    }

    /// Owned copy of the active window, oldest-first
    pub fn snapshot(&self) -> Vec<TelemetrySample> {
        self.active
            .as_ref()
            .map(|feed| feed.buffer.snapshot())
            .unwrap_or_default()
    }

    /// Chart-ready series projected from the current window
    pub fn series(&self) -> SeriesSet {
        series::project(&self.snapshot())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.active
            .as_ref()
            .map(|feed| feed.subscription.connection_state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// False means render the explicit "no live signal" affordance
    pub fn has_signal(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|feed| !feed.buffer.is_empty())
    }
}

impl ActiveFeed {
    fn apply(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::Sample(sample) => {
                if sample.vehicle_id != self.vehicle_id {
                    warn!(
                        expected = %self.vehicle_id,
                        got = %sample.vehicle_id,
                        "dropping sample for a different vehicle"
                    );
                    return;
                }
                if !self.buffer.push(sample) {
                    debug!(vehicle = %self.vehicle_id, "dropping out-of-order sample");
                }
            }
            SourceEvent::Replace(samples) => {
                let samples: Vec<TelemetrySample> = samples
                    .into_iter()
                    .filter(|s| s.vehicle_id == self.vehicle_id)
                    .collect();
                self.buffer.replace(samples);
            }
        }
    }
}
