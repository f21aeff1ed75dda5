//! Transport layer for the robot serial link
//!
//! Defines the connection parameters, the [`Transport`] handle used by the
//! reader loop and the command writer, and the [`TransportProvider`] seam the
//! link manager opens transports through.

pub mod mock;
pub mod serial;

use serde::{Deserialize, Serialize};
use spiderbot_core::ConnectionError;
use std::sync::Arc;
use std::time::Duration;

pub use mock::{MockProvider, MockTransport};
pub use serial::{list_ports, SerialPortInfo, SerialProvider, SerialTransport};

/// Read timeout used when none is configured
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Line terminator appended to every outbound command
pub const LINE_TERMINATOR: &str = "\r\n";

/// Connection lifecycle as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport open
    #[default]
    Disconnected,
    /// Transport open in progress. `LinkManager` keeps reporting
    /// `Disconnected` until the open has succeeded.
    Connecting,
    /// Transport open and reader loop running
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Baud rates the robot firmware can be flashed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    /// 9600 baud, the firmware default
    #[default]
    B9600,
    /// 38400 baud
    B38400,
    /// 115200 baud
    B115200,
}

impl BaudRate {
    /// Every supported rate, slowest first
    pub const ALL: [BaudRate; 3] = [BaudRate::B9600, BaudRate::B38400, BaudRate::B115200];

    /// Numeric rate
    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B38400 => 38400,
            BaudRate::B115200 => 115200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = ConnectionError;

    fn try_from(baud: u32) -> Result<Self, Self::Error> {
        match baud {
            9600 => Ok(BaudRate::B9600),
            38400 => Ok(BaudRate::B38400),
            115200 => Ok(BaudRate::B115200),
            _ => Err(ConnectionError::UnsupportedBaudRate { baud }),
        }
    }
}

impl From<BaudRate> for u32 {
    fn from(baud: BaudRate) -> Self {
        baud.as_u32()
    }
}

impl std::str::FromStr for BaudRate {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let baud = input
            .parse::<u32>()
            .map_err(|_| ConnectionError::InvalidBaudRate {
                input: input.to_string(),
            })?;
        BaudRate::try_from(baud)
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Parameters for opening a link
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionParams {
    /// Port identifier from the port directory
    pub port: String,
    /// Line speed
    pub baud_rate: BaudRate,
    /// Upper bound on a single blocking read
    pub read_timeout: Duration,
}

impl ConnectionParams {
    /// Parameters with the default read timeout
    pub fn new(port: impl Into<String>, baud_rate: BaudRate) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the read timeout
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// An open, line-oriented transport.
///
/// Reads and writes may happen concurrently from different threads.
pub trait Transport: Send + Sync {
    /// Read one complete line, waiting at most the read timeout.
    ///
    /// Returns `Ok(None)` when no complete line arrived in time.
    fn read_line(&self) -> Result<Option<String>, ConnectionError>;

    /// Write all bytes
    fn write_all(&self, data: &[u8]) -> Result<(), ConnectionError>;

    /// Port name this transport is bound to
    fn name(&self) -> String;
}

/// Shared handle to an open transport; one per connection generation
pub type TransportHandle = Arc<dyn Transport>;

/// Source of ports and transports
pub trait TransportProvider: Send + Sync {
    /// Ports currently visible to the OS, in OS order
    fn list_ports(&self) -> spiderbot_core::Result<Vec<SerialPortInfo>>;

    /// Open a transport; may block for the duration of device negotiation
    fn open(&self, params: &ConnectionParams) -> Result<TransportHandle, ConnectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_rate_conversion() {
        assert_eq!(BaudRate::try_from(9600).unwrap(), BaudRate::B9600);
        assert_eq!(BaudRate::try_from(115200).unwrap().as_u32(), 115200);
        assert_eq!(
            BaudRate::try_from(57600),
            Err(ConnectionError::UnsupportedBaudRate { baud: 57600 })
        );
        assert_eq!("38400".parse::<BaudRate>().unwrap(), BaudRate::B38400);
    }

    #[test]
    fn test_non_numeric_baud_keeps_input() {
        let err = "fast".parse::<BaudRate>().unwrap_err();
        assert_eq!(
            err,
            ConnectionError::InvalidBaudRate {
                input: "fast".to_string()
            }
        );
        assert!(err.to_string().contains("'fast'"));
        assert!(!err.to_string().contains(" 0 "));
    }

    #[test]
    fn test_connection_params_defaults() {
        let params = ConnectionParams::new("/dev/ttyUSB0", BaudRate::default());
        assert_eq!(params.baud_rate, BaudRate::B9600);
        assert_eq!(params.read_timeout, DEFAULT_READ_TIMEOUT);
    }
}
