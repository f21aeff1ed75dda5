//! Telemetry state shared between the reader loop and its consumers
//!
//! The robot reports a single ultrasonic distance reading. The reader loop
//! writes it, while the poll cycle and snapshot writer read it at their own
//! cadence. Only `get`/`set` are exposed; the guarded value never escapes.

use crate::types::{thread_safe, ThreadSafe};
use std::collections::VecDeque;

/// Number of samples kept for the distance plot.
pub const DEFAULT_HISTORY_LEN: usize = 50;

/// Last known distance reading in centimeters.
///
/// Cloning yields another handle to the same value. Last write wins and the
/// value survives disconnects, so consumers keep seeing the last known
/// reading rather than a blank.
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    distance_cm: ThreadSafe<f64>,
}

impl TelemetryStore {
    /// Create a store holding 0.0
    pub fn new() -> Self {
        Self {
            distance_cm: thread_safe(0.0),
        }
    }

    /// Record a new reading
    pub fn set(&self, distance_cm: f64) {
        *self.distance_cm.lock() = distance_cm;
    }

    /// Last known reading, 0.0 before any data has arrived
    pub fn get(&self) -> f64 {
        *self.distance_cm.lock()
    }
}

/// Fixed-length history of sampled distances feeding the sensor plot.
///
/// Starts pre-filled with zeros so the plot has a stable width from the
/// first frame.
#[derive(Debug, Clone)]
pub struct DistanceHistory {
    samples: VecDeque<f64>,
    max_len: usize,
}

impl DistanceHistory {
    /// Create a history of `max_len` zero samples
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            samples: std::iter::repeat(0.0).take(max_len).collect(),
            max_len,
        }
    }

    /// Append a sample, discarding the oldest one
    pub fn push(&mut self, distance_cm: f64) {
        if self.samples.len() == self.max_len {
            self.samples.pop_front();
        }
        self.samples.push_back(distance_cm);
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Most recent sample
    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or(0.0)
    }

    /// Number of samples held (always the configured length)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; the history is pre-filled
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Range for the radar marker; hidden for non-positive readings
    pub fn radar_point(&self) -> Option<f64> {
        let latest = self.latest();
        (latest > 0.0).then_some(latest)
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for DistanceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
