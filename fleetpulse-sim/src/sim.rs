//! Drive-cycle simulator that generates synthetic vehicle telemetry
//!
//! Simulates a repeating mixed urban/highway loop with idle, acceleration,
//! cruise and braking phases. Produces realistic-looking samples every two
//! seconds without requiring a real vehicle.

use crate::state::AppState;
use chrono::Utc;
use fleetpulse_core::model::{EngineStatus, TelemetrySample};
use fleetpulse_core::units::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cadence of the push channel; one sample per tick
pub const SAMPLE_PERIOD: Duration = Duration::from_secs(2);

// =============================================================================
// Drive cycle definition — a sequence of segments that form one loop
// =============================================================================

#[derive(Clone, Copy)]
enum SegmentKind {
    Idle,   // stationary, engine at idle
    Accel,  // pulling up to the segment's target speed
    Cruise, // holding speed with small variations
    Brake,  // slowing toward the target speed
}

#[derive(Clone, Copy)]
struct CycleSegment {
    kind: SegmentKind,
    duration: f64,     // seconds spent in this segment
    target_speed: f64, // km/h at the end of the segment
}

/// Mixed loop: pull-away, city blocks, a highway stretch, return to a stop.
/// Roughly four minutes per repetition.
fn demo_cycle() -> Vec<CycleSegment> {
    vec![
        // At the curb
        CycleSegment { kind: SegmentKind::Idle,   duration: 10.0, target_speed: 0.0 },
        // Pull away into city traffic
        CycleSegment { kind: SegmentKind::Accel,  duration: 12.0, target_speed: 45.0 },
        CycleSegment { kind: SegmentKind::Cruise, duration: 35.0, target_speed: 48.0 },
        // Traffic light
        CycleSegment { kind: SegmentKind::Brake,  duration: 8.0,  target_speed: 0.0 },
        CycleSegment { kind: SegmentKind::Idle,   duration: 12.0, target_speed: 0.0 },
        // Second city stretch
        CycleSegment { kind: SegmentKind::Accel,  duration: 10.0, target_speed: 55.0 },
        CycleSegment { kind: SegmentKind::Cruise, duration: 25.0, target_speed: 52.0 },
        // Highway on-ramp
        CycleSegment { kind: SegmentKind::Accel,  duration: 15.0, target_speed: 105.0 },
        CycleSegment { kind: SegmentKind::Cruise, duration: 60.0, target_speed: 110.0 },
        // Off-ramp and surface street
        CycleSegment { kind: SegmentKind::Brake,  duration: 12.0, target_speed: 50.0 },
        CycleSegment { kind: SegmentKind::Cruise, duration: 20.0, target_speed: 50.0 },
        // Back to a stop
        CycleSegment { kind: SegmentKind::Brake,  duration: 10.0, target_speed: 0.0 },
        CycleSegment { kind: SegmentKind::Idle,   duration: 15.0, target_speed: 0.0 },
    ]
}

// =============================================================================
// Interpolation — speed and pedal state derived from cycle position
// =============================================================================

struct CycleState {
    speed: f64,
    braking: bool,
}

fn compute_cycle_state(cycle: &[CycleSegment], cycle_time: f64) -> CycleState {
    let cycle_duration: f64 = cycle.iter().map(|s| s.duration).sum();
    let t = cycle_time % cycle_duration;

    // Find current segment
    let mut elapsed = 0.0_f64;
    let mut seg_idx = 0;
    for (i, seg) in cycle.iter().enumerate() {
        if elapsed + seg.duration > t {
            seg_idx = i;
            break;
        }
        elapsed += seg.duration;
        if i == cycle.len() - 1 {
            seg_idx = i;
        }
    }

    let seg = cycle[seg_idx];
    let seg_t = ((t - elapsed) / seg.duration).clamp(0.0, 1.0);

    // Previous segment's target speed (interpolation start)
    let prev_target_speed = if seg_idx > 0 {
        cycle[seg_idx - 1].target_speed
    } else {
        cycle.last().map(|s| s.target_speed).unwrap_or(0.0)
    };

    let speed = lerp(prev_target_speed, seg.target_speed, smoothstep(seg_t));
    let braking = matches!(seg.kind, SegmentKind::Brake);

    CycleState { speed, braking }
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Simple deterministic noise from a seed
fn noise(seed: f64) -> f64 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f64, amplitude: f64) -> f64 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

fn speed_to_gear(kmph: f64) -> u8 {
    match kmph {
        x if x < 20.0 => 1,
        x if x < 40.0 => 2,
        x if x < 65.0 => 3,
        x if x < 90.0 => 4,
        _ => 5,
    }
}

fn speed_to_rpm(kmph: f64, gear: u8) -> f64 {
    // Lower gear = higher revs for the same road speed
    let ratio = match gear {
        1 => 95.0,
        2 => 62.0,
        3 => 45.0,
        4 => 34.0,
        _ => 27.0,
    };
    (kmph * ratio + 800.0).clamp(800.0, 6500.0)
}

// =============================================================================
// VehicleSimulator
// =============================================================================

pub struct VehicleSimulator {
    vehicle_id: String,
    cycle: Vec<CycleSegment>,
    tick: u64,
    // Stateful follow models
    engine_temp: f64,
    fuel: f64,
    brake_wear: f64,
    latitude: f64,
    longitude: f64,
    heading: f64,
}

impl VehicleSimulator {
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            cycle: demo_cycle(),
            tick: 0,
            engine_temp: 72.0,
            fuel: 85.0,
            brake_wear: 15.0,
            latitude: 40.7128,
            longitude: -74.006,
            heading: 0.8,
        }
    }

    /// Generate the next sample along the drive cycle
    pub fn next_sample(&mut self) -> TelemetrySample {
        let period = SAMPLE_PERIOD.as_secs_f64();
        let t = self.tick as f64 * period;
        self.tick += 1;
        let n = self.tick as f64; // noise seed

        let state = compute_cycle_state(&self.cycle, t);
        let speed = (state.speed + jitter(n, 0.8)).max(0.0);
        let gear = speed_to_gear(speed);
        let rpm = (speed_to_rpm(speed, gear) + jitter(n * 1.1, 40.0)).clamp(800.0, 6500.0);

        // Engine warms toward an operating point that rises with load
        let temp_target = 88.0 + (rpm / 6500.0) * 8.0;
        self.engine_temp += (temp_target - self.engine_temp) * 0.08;
        let coolant = (self.engine_temp - 5.0 + jitter(n * 1.2, 0.6)).clamp(60.0, 100.0);

        // Alternator output follows engine load
        let load = rpm / 6500.0;
        let battery = (13.5 + (load - 0.5) * 1.0 + jitter(n * 1.3, 0.05)).clamp(12.5, 14.8);

        // Consumption roughly 8 l/100 km, expressed against tank percentage
        let fuel_usage = (speed / 100.0) * 8.0 / 3600.0 * period;
        self.fuel = (self.fuel - fuel_usage).max(5.0);

        // Pads wear when the brakes actually work
        if state.braking && speed > 5.0 {
            self.brake_wear = (self.brake_wear + 0.004).min(100.0);
        }

        // Dead-reckon along a slowly wandering heading
        let distance_m = speed / 3.6 * period;
        self.heading += jitter(n * 1.4, 0.02);
        self.latitude += distance_m * self.heading.cos() / 111_111.0;
        self.longitude +=
            distance_m * self.heading.sin() / (111_111.0 * self.latitude.to_radians().cos());

        let mut sample = TelemetrySample::new(self.vehicle_id.clone(), Utc::now());
        sample.speed_kmph = Some(Kmph(speed));
        sample.rpm = Some(Rpm(rpm));
        sample.engine_temp_c = Some(Celsius(self.engine_temp));
        sample.coolant_temp_c = Some(Celsius(coolant));
        sample.brake_wear_percent = Some(Percent::new(self.brake_wear));
        sample.battery_voltage_v = Some(Volts(battery));
        sample.fuel_level_percent = Some(Percent::new(self.fuel));
        sample.latitude = Some(self.latitude);
        sample.longitude = Some(self.longitude);
        sample.engine_status = Some(EngineStatus::On);
        sample
    }

    /// Final sample left behind when the cycle stops: engine off, parked
    pub fn parked_sample(&self) -> TelemetrySample {
        let mut sample = TelemetrySample::new(self.vehicle_id.clone(), Utc::now());
        sample.speed_kmph = Some(Kmph(0.0));
        sample.rpm = Some(Rpm(0.0));
        sample.engine_temp_c = Some(Celsius(self.engine_temp));
        sample.coolant_temp_c = Some(Celsius(self.engine_temp - 5.0));
        sample.brake_wear_percent = Some(Percent::new(self.brake_wear));
        sample.battery_voltage_v = Some(Volts(12.6));
        sample.fuel_level_percent = Some(Percent::new(self.fuel));
        sample.latitude = Some(self.latitude);
        sample.longitude = Some(self.longitude);
        sample.engine_status = Some(EngineStatus::Off);
        sample
    }
}

/// Per-vehicle simulator loop; records into the shared state until cancelled
pub async fn run(state: AppState, vehicle_id: String, cancel: CancellationToken) {
    let mut sim = VehicleSimulator::new(&vehicle_id);
    let mut ticker = tokio::time::interval(SAMPLE_PERIOD);

    info!(vehicle = %vehicle_id, "drive cycle started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        state.record(sim.next_sample()).await;
    }

    // Leave a parked reading so the live endpoint reflects the stop
    state.record(sim.parked_sample()).await;
    info!(vehicle = %vehicle_id, "drive cycle stopped");
}
