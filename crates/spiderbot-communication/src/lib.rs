//! # SpiderBot Communication
//!
//! The serial link between the console and the robot controller:
//! port enumeration, the transport abstraction, the link manager with its
//! background reader loop, and the text line protocol.

pub mod communication;
pub mod link;
pub mod protocol;

pub use communication::{
    list_ports, BaudRate, ConnectionParams, ConnectionState, MockProvider, MockTransport,
    SerialPortInfo, SerialProvider, SerialTransport, Transport, TransportHandle,
    TransportProvider, DEFAULT_READ_TIMEOUT, LINE_TERMINATOR,
};

pub use link::{dispatch_line, LinkManager};

pub use protocol::{classify, CommandFrame, InboundLine, MotionCommand};
