//! Telemetry source interface
//!
//! A source delivers telemetry for exactly one vehicle per subscription,
//! regardless of transport. Push and poll retrieval are two implementations
//! of this one trait, selected by configuration rather than hard-coded per
//! view.

use crate::error::TelemetryError;
use crate::model::{ConnectionState, TelemetrySample};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What a source delivers to its subscriber.
///
/// Wholesale replacement is a distinct operation from a single-sample push:
/// applying a history window as N pushes would silently reorder partial
/// overlaps, so the distinction is kept in the type.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// One freshly arrived sample, to be appended
    Sample(TelemetrySample),
    /// A fetched history window that replaces the buffer contents outright
    Replace(Vec<TelemetrySample>),
}

/// Trait for vehicle telemetry sources
///
/// Each implementation is responsible for:
/// - Delivering samples for the subscribed vehicle as `SourceEvent`s
/// - Keeping the subscription's `ConnectionState` current on open/close/error
/// - Containing its failures (log and degrade, never panic the stream)
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Begin delivering telemetry for one vehicle.
    ///
    /// The returned handle owns the background task; dropping or closing it
    /// tears the transport down. Subscribing to a new vehicle is the
    /// caller's cue to close the previous handle first.
    async fn subscribe(&self, vehicle_id: &str) -> Result<Subscription, TelemetryError>;
}

/// Owned handle to one vehicle's live feed.
///
/// Replaces the hidden module-level connection of the original design: the
/// transport lives exactly as long as this handle, and teardown is explicit
/// via [`Subscription::close`]. Dropping the handle cancels the task as a
/// backstop so an abandoned subscription cannot leak a socket or timer.
pub struct Subscription {
    events: mpsc::Receiver<SourceEvent>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(
        events: mpsc::Receiver<SourceEvent>,
        state: watch::Receiver<ConnectionState>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            state,
            cancel,
            task: Some(task),
        }
    }

    /// Await the next event; `None` once the feed has shut down
    pub async fn recv(&mut self) -> Option<SourceEvent> {
        self.events.recv().await
    }

    /// Non-blocking drain step; `None` when no event is pending
    pub fn try_recv(&mut self) -> Option<SourceEvent> {
        self.events.try_recv().ok()
    }

    /// Current transport connectivity, for display only
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Cancel the source task and wait for it to finish.
    ///
    /// After this returns, no timer fires and no socket remains open for
    /// this subscription.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
