//! # SpiderBot Core
//!
//! Core types shared by the SpiderBot console crates: the error taxonomy,
//! the telemetry store written by the serial reader loop, the frame relay
//! fed by the capture pipeline, the console logging capability, and the
//! snapshot writer.

pub mod error;
pub mod frame;
pub mod message;
pub mod snapshot;
pub mod telemetry;
pub mod types;

pub use error::{
    ConnectionError, Error, Result, SnapshotError, TelemetryError, PORT_BUSY_HINT,
};

pub use frame::{Frame, FrameChannel, FrameKind, FrameRelay, OfferOutcome, OverflowPolicy};

pub use message::{
    LogEntry, LogSink, LogSinkHandle, MessageLevel, MessageLog, TracingLogSink,
    DEFAULT_LOG_CAPACITY,
};

pub use snapshot::{Snapshot, SnapshotWriter};

pub use telemetry::{DistanceHistory, TelemetryStore, DEFAULT_HISTORY_LEN};

pub use types::{thread_safe, thread_safe_deque_with_capacity, ThreadSafe, ThreadSafeDeque};
