//! Frame relay between the capture producer and the display poller
//!
//! Each image stream gets its own bounded channel. Both ends are
//! non-blocking: the producer never waits for a slow display and the
//! display timer never waits for a frame.

use crate::types::{thread_safe_deque_with_capacity, ThreadSafeDeque};
use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Image stream a frame belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Visible-light camera
    Rgb,
    /// Thermal camera
    Thermal,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rgb => write!(f, "rgb"),
            Self::Thermal => write!(f, "thermal"),
        }
    }
}

/// A decoded image handed from the producer to the display
#[derive(Debug, Clone)]
pub struct Frame {
    /// Stream this frame belongs to
    pub kind: FrameKind,
    /// Pixel data
    pub image: RgbImage,
    /// When the producer captured it
    pub captured_at: DateTime<Local>,
}

impl Frame {
    /// Wrap an image captured now
    pub fn new(kind: FrameKind, image: RgbImage) -> Self {
        Self {
            kind,
            image,
            captured_at: Local::now(),
        }
    }
}

/// What to do when a channel is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest buffered item so the newest is kept
    #[default]
    EvictOldest,
    /// Discard the item being offered
    DropIncoming,
}

/// Result of a non-blocking offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Buffered without loss
    Accepted,
    /// Channel was full, an older item was discarded
    EvictedOldest,
    /// Channel was full, the offered item was discarded
    DroppedIncoming,
}

/// Bounded, mutex-guarded hand-off channel.
///
/// Cloning yields another handle to the same queue, so the producer and
/// consumer can each own one.
#[derive(Debug)]
pub struct FrameChannel<T> {
    queue: ThreadSafeDeque<T>,
    capacity: usize,
    policy: OverflowPolicy,
    dropped: Arc<AtomicU64>,
}

impl<T> Clone for FrameChannel<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            capacity: self.capacity,
            policy: self.policy,
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> FrameChannel<T> {
    /// Create a channel; a capacity of zero is raised to one
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: thread_safe_deque_with_capacity(capacity),
            capacity,
            policy,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Offer an item without blocking
    pub fn offer(&self, item: T) -> OfferOutcome {
        let mut queue = self.queue.lock();
        if queue.len() < self.capacity {
            queue.push_back(item);
            return OfferOutcome::Accepted;
        }

        self.dropped.fetch_add(1, Ordering::Relaxed);
        match self.policy {
            OverflowPolicy::EvictOldest => {
                queue.pop_front();
                queue.push_back(item);
                OfferOutcome::EvictedOldest
            }
            OverflowPolicy::DropIncoming => OfferOutcome::DroppedIncoming,
        }
    }

    /// Take the oldest buffered item, or `None` when empty
    pub fn try_take(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }

    /// Number of buffered items
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Maximum number of buffered items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Overflow policy in effect
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Total items discarded because the channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard everything buffered
    pub fn clear(&self) {
        self.queue.lock().clear();
    }
}

/// One channel per image stream, created once at startup.
#[derive(Debug, Clone)]
pub struct FrameRelay {
    rgb: FrameChannel<Frame>,
    thermal: FrameChannel<Frame>,
}

impl FrameRelay {
    /// Create both channels with the same capacity and policy
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            rgb: FrameChannel::new(capacity, policy),
            thermal: FrameChannel::new(capacity, policy),
        }
    }

    /// Channel carrying frames of `kind`
    pub fn channel(&self, kind: FrameKind) -> &FrameChannel<Frame> {
        match kind {
            FrameKind::Rgb => &self.rgb,
            FrameKind::Thermal => &self.thermal,
        }
    }

    /// Route a frame to its stream's channel without blocking
    pub fn offer(&self, frame: Frame) -> OfferOutcome {
        let kind = frame.kind;
        let outcome = self.channel(kind).offer(frame);
        if outcome != OfferOutcome::Accepted {
            tracing::trace!("{} frame channel full: {:?}", kind, outcome);
        }
        outcome
    }

    /// Take the next frame of `kind`, if any
    pub fn try_take(&self, kind: FrameKind) -> Option<Frame> {
        self.channel(kind).try_take()
    }

    /// Discard all buffered frames on both streams
    pub fn clear(&self) {
        self.rgb.clear();
        self.thermal.clear();
    }
}

impl Default for FrameRelay {
    /// Single-slot channels, newest frame wins
    fn default() -> Self {
        Self::new(1, OverflowPolicy::EvictOldest)
    }
}
