//! Error handling for SpiderBot
//!
//! Provides error types for each layer of the console:
//! - Connection errors (serial link lifecycle and I/O)
//! - Telemetry errors (inbound line parsing)
//! - Snapshot errors (writing captured data to disk)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Hint appended to busy-port failures, shown on the operator status surface.
pub const PORT_BUSY_HINT: &str =
    "another process holds the device (close the Arduino IDE or any other serial monitor)";

/// Connection error type
///
/// Represents failures while opening, using or closing the serial link
/// to the robot controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// No port identifier was supplied
    #[error("No serial port selected")]
    EmptyPort,

    /// The OS denied exclusive access to the port
    #[error("Port busy: {port} ({message})")]
    PortBusy {
        /// The name of the port that is busy.
        port: String,
        /// Human-readable description including the contention hint.
        message: String,
    },

    /// Any other failure while opening the port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Baud rate outside the supported set
    #[error("Baud rate {baud} not supported")]
    UnsupportedBaudRate {
        /// The unsupported baud rate.
        baud: u32,
    },

    /// Baud rate text that is not a number at all
    #[error("Invalid baud rate '{input}': expected one of 9600, 38400, 115200")]
    InvalidBaudRate {
        /// The text as entered.
        input: String,
    },

    /// Operation requires a live connection
    #[error("Not connected")]
    NotConnected,

    /// Reading from the transport failed
    #[error("Read failed: {reason}")]
    ReadFailed {
        /// The reason for the read failure.
        reason: String,
    },

    /// Writing to the transport failed
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// The reason for the write failure.
        reason: String,
    },
}

impl ConnectionError {
    /// Build a busy-port error carrying the standard contention hint.
    pub fn port_busy(port: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        ConnectionError::PortBusy {
            port: port.into(),
            message: format!("{}; {}", detail, PORT_BUSY_HINT),
        }
    }

    /// Text for the operator status line.
    pub fn user_message(&self) -> String {
        match self {
            ConnectionError::PortBusy { port, .. } => {
                format!("Port Busy! {} is in use: {}", port, PORT_BUSY_HINT)
            }
            ConnectionError::FailedToOpen { reason, .. } => format!("Serial Error: {}", reason),
            other => other.to_string(),
        }
    }

    /// Check if this is a busy-port error
    pub fn is_port_busy(&self) -> bool {
        matches!(self, ConnectionError::PortBusy { .. })
    }
}

/// Telemetry error type
///
/// Raised when a line that looks like telemetry carries an unusable payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// Telemetry payload could not be parsed
    #[error("Failed to parse telemetry '{line}': {reason}")]
    Parse {
        /// The offending line.
        line: String,
        /// The reason parsing failed.
        reason: String,
    },
}

/// Snapshot error type
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Filesystem failure while writing a snapshot
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding failure
    #[error("Snapshot image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Main error type for SpiderBot
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Telemetry error
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Snapshot error
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a busy-port connection error
    pub fn is_port_busy(&self) -> bool {
        matches!(self, Error::Connection(e) if e.is_port_busy())
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
