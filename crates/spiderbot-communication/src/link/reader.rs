//! Reader loop
//!
//! One background thread per connection generation. It owns a clone of that
//! generation's transport handle and a stop flag; it never looks at whatever
//! transport the link manager holds later, so a superseded loop cannot feed
//! a newer connection.

use crate::communication::TransportHandle;
use crate::protocol::{classify, InboundLine};
use spiderbot_core::{LogSink, LogSinkHandle, TelemetryStore};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Pause after an iteration that produced no line
pub const IDLE_BACKOFF: Duration = Duration::from_millis(20);

/// Apply one inbound line: telemetry updates the store, everything else
/// goes to the console log.
pub fn dispatch_line(line: &str, telemetry: &TelemetryStore, log: &dyn LogSink) -> InboundLine {
    let inbound = classify(line);
    match &inbound {
        InboundLine::Empty => {}
        InboundLine::Distance(distance) => {
            tracing::trace!("Distance reading: {} cm", distance);
            telemetry.set(*distance);
        }
        InboundLine::Malformed(e) => {
            tracing::debug!("{}", e);
            log.log(&format!("RX parse error: {}", e));
        }
        InboundLine::Info(text) => log.log(&format!("RX: {}", text)),
    }
    inbound
}

pub(crate) struct ReaderLoop {
    pub(crate) transport: TransportHandle,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) telemetry: TelemetryStore,
    pub(crate) log: LogSinkHandle,
    pub(crate) generation: u64,
}

impl ReaderLoop {
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("serial-reader-{}", self.generation))
            .spawn(move || self.run())
    }

    fn run(self) {
        tracing::debug!(
            "Reader loop {} started on {}",
            self.generation,
            self.transport.name()
        );

        while self.running.load(Ordering::Acquire) {
            let idle = match self.transport.read_line() {
                Ok(Some(line)) => {
                    // Stopped while blocked in the read: the line belongs to a
                    // closed generation.
                    if !self.running.load(Ordering::Acquire) {
                        break;
                    }
                    dispatch_line(&line, &self.telemetry, self.log.as_ref());
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    tracing::warn!("Reader loop {}: {}", self.generation, e);
                    self.log.log(&format!("RX Error: {}", e));
                    true
                }
            };

            if idle {
                thread::sleep(IDLE_BACKOFF);
            }
        }

        tracing::debug!("Reader loop {} stopped", self.generation);
    }
}
