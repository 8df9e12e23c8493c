//! Application state management

use crate::sim;
use fleetpulse_core::model::{TelemetrySample, Vehicle};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

/// Samples retained server-side per vehicle for the history endpoint
const HISTORY_WINDOW: usize = 500;

/// Broadcast capacity per vehicle; slow sockets lag rather than block
const BROADCAST_CAPACITY: usize = 100;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Live feed per vehicle, created lazily on first touch
    feeds: Arc<RwLock<HashMap<String, VehicleFeed>>>,

    /// Known vehicles, for the owned-vehicles endpoint
    registry: Arc<RwLock<Vec<Vehicle>>>,
}

/// Everything the service tracks for one vehicle
struct VehicleFeed {
    latest: Option<TelemetrySample>,
    history: VecDeque<TelemetrySample>, // oldest-first
    tx: broadcast::Sender<TelemetrySample>,
    sim_cancel: Option<CancellationToken>,
}

impl VehicleFeed {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            latest: None,
            history: VecDeque::new(),
            tx,
            sim_cancel: None,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            feeds: Arc::new(RwLock::new(HashMap::new())),
            registry: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn register_vehicle(&self, vehicle: Vehicle) {
        let mut registry = self.registry.write().await;
        registry.push(vehicle);
    }

    pub async fn vehicles_owned_by(&self, user_id: &str) -> Vec<Vehicle> {
        let registry = self.registry.read().await;
        registry
            .iter()
            .filter(|v| v.owner_user_id == user_id)
            .cloned()
            .collect()
    }

    /// Store a sample and fan it out to connected push sessions
    pub async fn record(&self, sample: TelemetrySample) {
        let mut feeds = self.feeds.write().await;
        let feed = feeds
            .entry(sample.vehicle_id.clone())
            .or_insert_with(VehicleFeed::new);

        if feed.history.len() == HISTORY_WINDOW {
            feed.history.pop_front();
        }
        feed.history.push_back(sample.clone());
        feed.latest = Some(sample.clone());

        // Ignore error when no session is subscribed
        let _ = feed.tx.send(sample);
    }

    pub async fn latest(&self, vehicle_id: &str) -> Option<TelemetrySample> {
        let feeds = self.feeds.read().await;
        feeds.get(vehicle_id).and_then(|f| f.latest.clone())
    }

    /// Recent samples, newest-first, at most `limit`
    pub async fn history(&self, vehicle_id: &str, limit: usize) -> Vec<TelemetrySample> {
        let feeds = self.feeds.read().await;
        match feeds.get(vehicle_id) {
            Some(feed) => feed.history.iter().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Subscribe to a vehicle's push feed, creating it if absent
    pub async fn subscribe(&self, vehicle_id: &str) -> broadcast::Receiver<TelemetrySample> {
        let mut feeds = self.feeds.write().await;
        feeds
            .entry(vehicle_id.to_string())
            .or_insert_with(VehicleFeed::new)
            .tx
            .subscribe()
    }

    /// Start the drive cycle for a vehicle; false when already running
    pub async fn start_simulator(&self, vehicle_id: &str) -> bool {
        let mut feeds = self.feeds.write().await;
        let feed = feeds
            .entry(vehicle_id.to_string())
            .or_insert_with(VehicleFeed::new);
        if feed.sim_cancel.is_some() {
            return false;
        }
        let cancel = CancellationToken::new();
        feed.sim_cancel = Some(cancel.clone());
        tokio::spawn(sim::run(self.clone(), vehicle_id.to_string(), cancel));
        true
    }

    /// Stop the drive cycle for a vehicle; false when not running
    pub async fn stop_simulator(&self, vehicle_id: &str) -> bool {
        let mut feeds = self.feeds.write().await;
        match feeds.get_mut(vehicle_id).and_then(|f| f.sim_cancel.take()) {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn simulator_running(&self, vehicle_id: &str) -> bool {
        let feeds = self.feeds.read().await;
        feeds
            .get(vehicle_id)
            .is_some_and(|f| f.sim_cancel.is_some())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
