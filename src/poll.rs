//! Display poll cycle
//!
//! Runs on the console's refresh timer. Each tick drains at most one frame
//! per stream from the relay, samples the telemetry store and advances the
//! distance plot. The cycle never blocks on the serial link.

use spiderbot_core::{
    DistanceHistory, Frame, FrameKind, FrameRelay, Snapshot, SnapshotError, SnapshotWriter,
    TelemetryStore,
};

/// What one tick observed
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    /// Distance sampled this tick, in centimeters
    pub distance_cm: f64,
    /// Radar marker range; `None` hides the marker
    pub radar_point: Option<f64>,
    /// A new RGB frame was taken from the relay
    pub rgb_updated: bool,
    /// A new thermal frame was taken from the relay
    pub thermal_updated: bool,
}

/// Consumer side of the telemetry store and the frame relay
pub struct PollCycle {
    relay: FrameRelay,
    telemetry: TelemetryStore,
    history: DistanceHistory,
    latest_rgb: Option<Frame>,
    latest_thermal: Option<Frame>,
    ticks: u64,
}

impl PollCycle {
    /// Cycle over `relay` and `telemetry` keeping `history_len` plot samples
    pub fn new(relay: FrameRelay, telemetry: TelemetryStore, history_len: usize) -> Self {
        Self {
            relay,
            telemetry,
            history: DistanceHistory::new(history_len),
            latest_rgb: None,
            latest_thermal: None,
            ticks: 0,
        }
    }

    /// Run one refresh
    pub fn tick(&mut self) -> PollSnapshot {
        let rgb = self.relay.try_take(FrameKind::Rgb);
        let thermal = self.relay.try_take(FrameKind::Thermal);
        let rgb_updated = rgb.is_some();
        let thermal_updated = thermal.is_some();

        if rgb.is_some() {
            self.latest_rgb = rgb;
        }
        if thermal.is_some() {
            self.latest_thermal = thermal;
        }

        let distance_cm = self.telemetry.get();
        self.history.push(distance_cm);
        self.ticks += 1;

        PollSnapshot {
            distance_cm,
            radar_point: self.history.radar_point(),
            rgb_updated,
            thermal_updated,
        }
    }

    /// Save the latest frames and the current distance
    pub fn save_snapshot(&self, writer: &SnapshotWriter) -> Result<Snapshot, SnapshotError> {
        writer.capture(
            self.latest_rgb.as_ref(),
            self.latest_thermal.as_ref(),
            self.telemetry.get(),
        )
    }

    /// Producer handle for the capture pipeline
    pub fn relay(&self) -> &FrameRelay {
        &self.relay
    }

    /// Distance plot samples, oldest first
    pub fn history(&self) -> &DistanceHistory {
        &self.history
    }

    /// Most recent frame of a stream, kept for snapshots
    pub fn latest_frame(&self, kind: FrameKind) -> Option<&Frame> {
        match kind {
            FrameKind::Rgb => self.latest_rgb.as_ref(),
            FrameKind::Thermal => self.latest_thermal.as_ref(),
        }
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
