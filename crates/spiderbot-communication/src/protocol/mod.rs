//! Robot line protocol
//!
//! Text, one message per line, CRLF on transmit.

pub mod commands;
pub mod line_parser;

pub use commands::{CommandFrame, MotionCommand};
pub use line_parser::{classify, is_bare_number, InboundLine, DISTANCE_LABEL, FIELD_SEPARATOR};
