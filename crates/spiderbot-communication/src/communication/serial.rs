//! Serial port communication implementation
//!
//! Provides the OS-backed side of the link:
//! - Port enumeration (the port directory)
//! - Opening a port with a bounded read timeout
//! - Line assembly from raw bytes
//! - Classification of open failures (busy vs. other)

use super::{ConnectionParams, Transport, TransportHandle, TransportProvider};
use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use spiderbot_core::{ConnectionError, Error, Result};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Longest partial line kept while waiting for a terminator
pub const MAX_LINE_LEN: usize = 1024;

/// One entry of the port directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// OS identifier passed back to `connect` ("/dev/ttyUSB0", "COM3")
    pub port_name: String,
    /// Short human label for the device behind the port
    pub description: String,
    /// USB vendor and product id, for adapters that report them
    pub usb_id: Option<(u16, u16)>,
}

impl SerialPortInfo {
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            usb_id: None,
        }
    }

    /// Attach the adapter's USB ids
    pub fn with_usb_id(mut self, vid: u16, pid: u16) -> Self {
        self.usb_id = Some((vid, pid));
        self
    }
}

impl std::fmt::Display for SerialPortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.port_name, self.description)?;
        if let Some((vid, pid)) = self.usb_id {
            write!(f, " [{:04x}:{:04x}]", vid, pid)?;
        }
        Ok(())
    }
}

/// List serial ports currently known to the OS.
///
/// Queried fresh on every call. USB adapters and Bluetooth SPP links are
/// both valid robot links, so nothing is filtered and the OS order is kept.
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Serial port enumeration failed: {}", e);
        Error::other(format!("Cannot list serial ports: {}", e))
    })?;
    Ok(ports.iter().map(directory_entry).collect())
}

fn directory_entry(port: &serialport::SerialPortInfo) -> SerialPortInfo {
    use serialport::SerialPortType;

    match &port.port_type {
        SerialPortType::UsbPort(usb) => {
            let label = usb
                .product
                .as_deref()
                .or(usb.manufacturer.as_deref())
                .unwrap_or("USB serial adapter");
            SerialPortInfo::new(&port.port_name, label).with_usb_id(usb.vid, usb.pid)
        }
        SerialPortType::BluetoothPort => SerialPortInfo::new(&port.port_name, "Bluetooth link"),
        SerialPortType::PciPort => SerialPortInfo::new(&port.port_name, "PCI serial"),
        _ => SerialPortInfo::new(&port.port_name, "serial"),
    }
}

/// Map an open failure to the connection error taxonomy.
///
/// Windows reports a port held by another program as "Access is denied";
/// Unix reports EBUSY from the exclusive-open ioctl.
pub fn classify_open_error(port: &str, err: &serialport::Error) -> ConnectionError {
    let busy_kind = matches!(
        err.kind(),
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied)
            | serialport::ErrorKind::Io(io::ErrorKind::ResourceBusy)
    );
    let text = err.description.to_ascii_lowercase();

    if busy_kind || text.contains("access is denied") || text.contains("busy") {
        ConnectionError::port_busy(port, &err.description)
    } else {
        ConnectionError::FailedToOpen {
            port: port.to_string(),
            reason: err.description.clone(),
        }
    }
}

/// Splits a byte stream into trimmed text lines.
///
/// Invalid UTF-8 is replaced rather than rejected. A partial line that grows
/// past [`MAX_LINE_LEN`] without a terminator is discarded up to and
/// including its eventual terminator, so no tail of it is ever emitted.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
    discarding: bool,
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes
    pub fn feed(&mut self, mut bytes: &[u8]) {
        if self.discarding {
            match bytes.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    bytes = &bytes[end + 1..];
                }
                None => return,
            }
        }

        self.pending.extend_from_slice(bytes);

        let partial_start = self
            .pending
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |end| end + 1);
        if self.pending.len() - partial_start > MAX_LINE_LEN {
            tracing::warn!(
                "Discarding {} bytes of unterminated serial input",
                self.pending.len() - partial_start
            );
            self.pending.truncate(partial_start);
            self.discarding = true;
        }
    }

    /// True while skipping the remainder of an overlong line
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Pop the next complete line, if one is buffered
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }

    /// Bytes waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

struct SerialReader {
    port: Box<dyn serialport::SerialPort>,
    lines: LineAssembler,
    buf: [u8; 256],
}

/// Serial transport with independent read and write handles
pub struct SerialTransport {
    name: String,
    reader: Mutex<SerialReader>,
    writer: Mutex<Box<dyn serialport::SerialPort>>,
}

impl SerialTransport {
    /// Open a serial port, 8N1 without flow control
    pub fn open(params: &ConnectionParams) -> std::result::Result<Self, ConnectionError> {
        let port = serialport::new(&params.port, params.baud_rate.as_u32())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(params.read_timeout)
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                classify_open_error(&params.port, &e)
            })?;

        let writer = port.try_clone().map_err(|e| ConnectionError::FailedToOpen {
            port: params.port.clone(),
            reason: format!("cannot clone handle: {}", e),
        })?;

        tracing::info!(
            "Opened serial port: {} at {} baud",
            params.port,
            params.baud_rate
        );

        Ok(Self {
            name: params.port.clone(),
            reader: Mutex::new(SerialReader {
                port,
                lines: LineAssembler::new(),
                buf: [0u8; 256],
            }),
            writer: Mutex::new(writer),
        })
    }
}

impl Transport for SerialTransport {
    fn read_line(&self) -> std::result::Result<Option<String>, ConnectionError> {
        let mut reader = self.reader.lock();
        if let Some(line) = reader.lines.next_line() {
            return Ok(Some(line));
        }

        let SerialReader { port, lines, buf } = &mut *reader;
        match port.read(buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                lines.feed(&buf[..n]);
                Ok(lines.next_line())
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(ConnectionError::ReadFailed {
                reason: e.to_string(),
            }),
        }
    }

    fn write_all(&self, data: &[u8]) -> std::result::Result<(), ConnectionError> {
        let mut writer = self.writer.lock();
        writer
            .write_all(data)
            .and_then(|_| writer.flush())
            .map_err(|e| ConnectionError::WriteFailed {
                reason: e.to_string(),
            })
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Provider backed by the OS serial subsystem
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialProvider;

impl TransportProvider for SerialProvider {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>> {
        list_ports()
    }

    fn open(&self, params: &ConnectionParams) -> std::result::Result<TransportHandle, ConnectionError> {
        Ok(Arc::new(SerialTransport::open(params)?))
    }
}
