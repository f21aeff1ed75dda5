//! Operator console messages
//!
//! The link reports every transmitted command, every informational line from
//! the robot and every transport error through a [`LogSink`] handed to it at
//! construction. Sinks must return quickly; they are called from the reader
//! loop and the command path.

use crate::types::{thread_safe_deque_with_capacity, ThreadSafeDeque};
use chrono::{DateTime, Local};
use std::sync::Arc;

/// Default number of messages retained by [`MessageLog`]
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Fire-and-forget destination for console messages
pub trait LogSink: Send + Sync {
    /// Record one message
    fn log(&self, message: &str);
}

/// Shared handle to a log sink
pub type LogSinkHandle = Arc<dyn LogSink>;

/// Forwards console messages to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "spiderbot::console", "{}", message);
    }
}

/// Message severity as shown in the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// General information
    Info,
    /// Command sent to the robot
    Command,
    /// Line received from the robot
    Received,
    /// Transport or parse failure
    Error,
}

impl MessageLevel {
    /// Classify a message by its conventional prefix
    pub fn classify(message: &str) -> Self {
        if message.starts_with("TX Error")
            || message.starts_with("RX Error")
            || message.starts_with("RX parse error")
        {
            MessageLevel::Error
        } else if message.starts_with("TX:") {
            MessageLevel::Command
        } else if message.starts_with("RX:") {
            MessageLevel::Received
        } else {
            MessageLevel::Info
        }
    }
}

/// A timestamped console message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// When it was logged
    pub timestamp: DateTime<Local>,
    /// Derived severity
    pub level: MessageLevel,
    /// Message text
    pub text: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S%.3f"), self.text)
    }
}

/// Bounded in-memory console history.
///
/// Oldest entries are discarded once capacity is reached. Every message is
/// also mirrored to `tracing` at a level matching its severity.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: ThreadSafeDeque<LogEntry>,
    capacity: usize,
}

impl MessageLog {
    /// Create a log retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: thread_safe_deque_with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message
    pub fn push(&self, text: impl Into<String>) {
        let text = text.into();
        let level = MessageLevel::classify(&text);

        match level {
            MessageLevel::Error => tracing::warn!(target: "spiderbot::console", "{}", text),
            MessageLevel::Command | MessageLevel::Received => {
                tracing::debug!(target: "spiderbot::console", "{}", text)
            }
            MessageLevel::Info => tracing::info!(target: "spiderbot::console", "{}", text),
        }

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            timestamp: Local::now(),
            level,
            text,
        });
    }

    /// Snapshot of all retained entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Text of the last `count` messages, oldest first
    pub fn recent(&self, count: usize) -> Vec<String> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).map(|e| e.text.clone()).collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing has been logged
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl LogSink for MessageLog {
    fn log(&self, message: &str) {
        self.push(message);
    }
}
