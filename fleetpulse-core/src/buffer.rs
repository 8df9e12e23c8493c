//! Bounded rolling history of telemetry samples
//!
//! One buffer per active vehicle view. Capacity is fixed at construction;
//! inserting at capacity evicts the oldest entry (FIFO — recency of arrival
//! is the only signal). The buffer never mutates a stored sample, only
//! appends and evicts.

use crate::model::TelemetrySample;
use std::collections::VecDeque;

/// Fixed-capacity FIFO window over the most recent samples.
///
/// Stored oldest-first; `snapshot()` hands out an owned copy in the same
/// order, so chart consumers that sort or reverse in place can never corrupt
/// the internal state.
#[derive(Debug)]
pub struct HistoryBuffer {
    capacity: usize,
    samples: VecDeque<TelemetrySample>,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// A zero capacity is clamped to 1: a buffer that can never hold a
    /// sample has no meaningful behavior.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the newest stored sample, if any
    pub fn newest_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.samples.back().map(|s| s.timestamp)
    }

    /// Append the newest sample, evicting the oldest entry at capacity.
    ///
    /// Samples strictly older than the newest stored entry are rejected
    /// (returns `false`); the source already delivers in non-decreasing
    /// timestamp order, so a stale arrival is an out-of-order glitch the
    /// caller should log, not chart.
    pub fn push(&mut self, sample: TelemetrySample) -> bool {
        if let Some(newest) = self.newest_timestamp() {
            if sample.timestamp < newest {
                return false;
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        true
    }

    /// Replace the entire window with a fetched history response.
    ///
    /// Distinct from repeated `push`: a poll-mode history fetch is a direct
    /// assignment, so partial overlaps with previous contents can never
    /// reorder. Input may arrive newest-first (as the history endpoint
    /// serves it); it is sorted ascending by timestamp and truncated to the
    /// most recent `capacity` entries.
    pub fn replace(&mut self, mut samples: Vec<TelemetrySample>) {
        samples.sort_by_key(|s| s.timestamp);
        if samples.len() > self.capacity {
            samples.drain(..samples.len() - self.capacity);
        }
        self.samples = samples.into();
    }

    /// Owned copy of the window, oldest-first
    pub fn snapshot(&self) -> Vec<TelemetrySample> {
        self.samples.iter().cloned().collect()
    }
}
