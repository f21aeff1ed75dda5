//! Link manager
//!
//! Owns the serial link lifecycle. `connect` opens a transport and starts a
//! reader loop bound to it; `disconnect` stops that loop and releases the
//! transport. Commands are written from the caller's thread.
//!
//! State machine:
//! ```text
//! Disconnected --connect ok--> Connected --disconnect--> Disconnected
//! Disconnected --connect err-> Disconnected
//! Connected --connect--> (implicit disconnect) --> Connected | Disconnected
//! ```

use super::reader::ReaderLoop;
use crate::communication::{
    BaudRate, ConnectionParams, ConnectionState, SerialPortInfo, SerialProvider, TransportHandle,
    TransportProvider,
};
use crate::protocol::{CommandFrame, MotionCommand};
use parking_lot::Mutex;
use spiderbot_core::{ConnectionError, LogSinkHandle, TelemetryStore};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct ActiveLink {
    params: ConnectionParams,
    transport: TransportHandle,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    generation: u64,
}

#[derive(Default)]
struct LinkSlot {
    state: ConnectionState,
    active: Option<ActiveLink>,
    last_failure: Option<String>,
}

/// Serial link to the robot controller
pub struct LinkManager {
    provider: Arc<dyn TransportProvider>,
    log: LogSinkHandle,
    telemetry: TelemetryStore,
    slot: Mutex<LinkSlot>,
    lifecycle: Mutex<()>,
    generations: AtomicU64,
}

impl LinkManager {
    /// Create a manager opening transports through `provider`
    pub fn new(provider: Arc<dyn TransportProvider>, log: LogSinkHandle) -> Self {
        Self {
            provider,
            log,
            telemetry: TelemetryStore::new(),
            slot: Mutex::new(LinkSlot::default()),
            lifecycle: Mutex::new(()),
            generations: AtomicU64::new(0),
        }
    }

    /// Create a manager backed by the OS serial ports
    pub fn serial(log: LogSinkHandle) -> Self {
        Self::new(Arc::new(SerialProvider), log)
    }

    /// Publish readings into an existing store instead of a private one
    pub fn with_telemetry(mut self, telemetry: TelemetryStore) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Names of the ports currently visible; empty if enumeration fails
    pub fn list_ports(&self) -> Vec<String> {
        self.list_port_info()
            .into_iter()
            .map(|p| p.port_name)
            .collect()
    }

    /// Detailed port listing; empty if enumeration fails
    pub fn list_port_info(&self) -> Vec<SerialPortInfo> {
        match self.provider.list_ports() {
            Ok(ports) => ports,
            Err(e) => {
                tracing::warn!("Port enumeration failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Open `port` at `baud`, replacing any existing connection
    pub fn connect(&self, port: &str, baud: BaudRate) -> Result<String, ConnectionError> {
        self.connect_with(ConnectionParams::new(port, baud))
    }

    /// Open a link with explicit parameters, replacing any existing connection
    pub fn connect_with(&self, params: ConnectionParams) -> Result<String, ConnectionError> {
        let _lifecycle = self.lifecycle.lock();
        self.teardown();

        if params.port.trim().is_empty() {
            return Err(self.fail(ConnectionError::EmptyPort));
        }

        // Stays Disconnected while the OS open blocks; callers only ever see
        // the outcome.
        let transport = match self.provider.open(&params) {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("Connection to {} failed: {}", params.port, e);
                return Err(self.fail(e));
            }
        };

        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let running = Arc::new(AtomicBool::new(true));
        let reader = ReaderLoop {
            transport: Arc::clone(&transport),
            running: Arc::clone(&running),
            telemetry: self.telemetry.clone(),
            log: Arc::clone(&self.log),
            generation,
        }
        .spawn()
        .map_err(|e| ConnectionError::FailedToOpen {
            port: params.port.clone(),
            reason: format!("cannot start reader: {}", e),
        });
        let reader = match reader {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(e)),
        };

        let message = format!("Connected to {}", params.port);
        tracing::info!(
            "{} at {} baud (generation {})",
            message,
            params.baud_rate,
            generation
        );

        let mut slot = self.slot.lock();
        slot.state = ConnectionState::Connected;
        slot.last_failure = None;
        slot.active = Some(ActiveLink {
            params,
            transport,
            running,
            reader: Some(reader),
            generation,
        });

        Ok(message)
    }

    /// Close the link; a no-op when already disconnected
    pub fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock();
        self.teardown();
    }

    /// Send one line of text. Returns false when not connected or the write fails.
    ///
    /// The write runs under the lifecycle lock, so once `disconnect` returns
    /// no send can still reach the closed transport.
    pub fn send_command(&self, text: &str) -> bool {
        let frame = CommandFrame::new(text);

        let outcome = {
            let _lifecycle = self.lifecycle.lock();
            let transport = self
                .slot
                .lock()
                .active
                .as_ref()
                .map(|link| Arc::clone(&link.transport));

            transport.map(|transport| {
                transport.write_all(&frame.encode()).map_err(|e| {
                    tracing::warn!("Write to {} failed: {}", transport.name(), e);
                    e
                })
            })
        };

        // Sinks run outside the lock; they may call back into the manager.
        match outcome {
            None => {
                tracing::debug!("Not connected, dropping command {:?}", text);
                false
            }
            Some(Ok(())) => {
                self.log.log(&format!("TX: {}", frame.text()));
                true
            }
            Some(Err(e)) => {
                self.log.log(&format!("TX Error: {} ({})", e, frame.text()));
                false
            }
        }
    }

    /// Send a gait command
    pub fn send_motion(&self, command: MotionCommand) -> bool {
        self.send_command(command.as_str())
    }

    /// Last known distance in centimeters
    pub fn get_distance(&self) -> f64 {
        self.telemetry.get()
    }

    /// Handle to the telemetry store fed by the reader loop
    pub fn telemetry(&self) -> TelemetryStore {
        self.telemetry.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.slot.lock().state
    }

    /// True while a transport is open
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Port of the live connection
    pub fn port_name(&self) -> Option<String> {
        self.slot
            .lock()
            .active
            .as_ref()
            .map(|link| link.params.port.clone())
    }

    /// Generation number of the live connection
    pub fn generation(&self) -> Option<u64> {
        self.slot.lock().active.as_ref().map(|link| link.generation)
    }

    /// Operator-facing text of the most recent failed connect
    pub fn last_failure(&self) -> Option<String> {
        self.slot.lock().last_failure.clone()
    }

    fn fail(&self, error: ConnectionError) -> ConnectionError {
        let mut slot = self.slot.lock();
        slot.state = ConnectionState::Disconnected;
        slot.last_failure = Some(error.user_message());
        error
    }

    /// Stop the reader loop and release the transport. Caller holds `lifecycle`.
    fn teardown(&self) {
        let active = {
            let mut slot = self.slot.lock();
            slot.state = ConnectionState::Disconnected;
            slot.active.take()
        };

        let Some(mut link) = active else {
            return;
        };

        link.running.store(false, Ordering::Release);
        if let Some(reader) = link.reader.take() {
            if reader.thread().id() == thread::current().id() {
                // Called from the reader's own log sink; it exits on its next check.
                tracing::debug!("Disconnect requested from reader loop {}", link.generation);
            } else if reader.join().is_err() {
                tracing::error!("Reader loop {} panicked", link.generation);
            }
        }

        tracing::info!(
            "Disconnected from {} (generation {})",
            link.params.port,
            link.generation
        );
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::MockProvider;
    use spiderbot_core::MessageLog;
    use std::time::Duration;

    fn manager(ports: &[&str]) -> (LinkManager, Arc<MockProvider>, Arc<MessageLog>) {
        let provider = Arc::new(MockProvider::new(ports.iter().copied()));
        let log = Arc::new(MessageLog::default());
        let manager = LinkManager::new(provider.clone(), log.clone());
        (manager, provider, log)
    }

    fn fast(port: &str) -> ConnectionParams {
        ConnectionParams::new(port, BaudRate::B9600).with_read_timeout(Duration::from_millis(5))
    }

    #[test]
    fn test_initial_state() {
        let (manager, _, _) = manager(&["COM3"]);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.get_distance(), 0.0);
        assert_eq!(manager.port_name(), None);
        assert_eq!(manager.list_ports(), vec!["COM3".to_string()]);
    }

    #[test]
    fn test_connect_reports_port() {
        let (manager, _, _) = manager(&["COM3"]);
        let message = manager.connect_with(fast("COM3")).unwrap();
        assert_eq!(message, "Connected to COM3");
        assert!(manager.is_connected());
        assert_eq!(manager.port_name().as_deref(), Some("COM3"));
        assert_eq!(manager.generation(), Some(1));
    }

    #[test]
    fn test_empty_port_rejected() {
        let (manager, provider, _) = manager(&["COM3"]);
        assert_eq!(
            manager.connect_with(fast("  ")),
            Err(ConnectionError::EmptyPort)
        );
        assert!(provider.opened().is_empty());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_while_disconnected_is_refused() {
        let (manager, _, log) = manager(&["COM3"]);
        assert!(!manager.send_command("stop"));
        assert!(!manager.send_motion(MotionCommand::Forward));
        assert!(log.is_empty());
    }

    #[test]
    fn test_connecting_never_observed_during_open() {
        let (manager, provider, _) = manager(&["COM3"]);
        provider.set_open_delay(Duration::from_millis(100));
        let manager = Arc::new(manager);

        let connecting = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || manager.connect_with(fast("COM3")))
        };

        let mut seen = Vec::new();
        while !connecting.is_finished() {
            seen.push(manager.state());
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(connecting.join().unwrap().is_ok());
        assert!(!seen.contains(&ConnectionState::Connecting));
        assert!(seen.contains(&ConnectionState::Disconnected));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_send_after_disconnect_never_reaches_old_transport() {
        let (manager, provider, _) = manager(&["COM3"]);
        let manager = Arc::new(manager);
        manager.connect_with(fast("COM3")).unwrap();
        let transport = provider.last_opened().unwrap();

        let sender = {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                let mut accepted = 0usize;
                for _ in 0..200 {
                    if manager.send_command("forward") {
                        accepted += 1;
                    }
                }
                accepted
            })
        };

        std::thread::sleep(Duration::from_millis(1));
        manager.disconnect();
        let written_at_disconnect = transport.written().len();

        let accepted = sender.join().unwrap();
        assert_eq!(transport.written().len(), written_at_disconnect);
        assert_eq!(accepted, written_at_disconnect);
    }

    #[test]
    fn test_drop_disconnects() {
        let (manager, provider, _) = manager(&["COM3"]);
        manager.connect_with(fast("COM3")).unwrap();
        let transport = provider.last_opened().unwrap();
        drop(manager);

        let reads = transport.read_count();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(transport.read_count(), reads);
    }
}
