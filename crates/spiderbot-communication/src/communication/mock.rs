//! Mock transport for testing
//!
//! Lets the link manager and reader loop run without hardware: inbound lines
//! are scripted, outbound writes are recorded, and open/read/write failures
//! can be injected.

use super::{ConnectionParams, SerialPortInfo, Transport, TransportHandle, TransportProvider};
use parking_lot::Mutex;
use spiderbot_core::ConnectionError;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted transport; clones share the same state
#[derive(Clone)]
pub struct MockTransport {
    name: String,
    read_timeout: Duration,
    inner: Arc<Mutex<MockTransportInner>>,
    reads: Arc<AtomicU64>,
}

struct MockTransportInner {
    inbound: VecDeque<Result<String, ConnectionError>>,
    written: Vec<Vec<u8>>,
    write_failure: Option<String>,
}

impl MockTransport {
    /// Create a mock transport; an idle read sleeps for `read_timeout`
    pub fn new(name: impl Into<String>, read_timeout: Duration) -> Self {
        MockTransport {
            name: name.into(),
            read_timeout,
            inner: Arc::new(Mutex::new(MockTransportInner {
                inbound: VecDeque::new(),
                written: Vec::new(),
                write_failure: None,
            })),
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a line to be returned by a later read
    pub fn push_line(&self, line: impl Into<String>) {
        self.inner.lock().inbound.push_back(Ok(line.into()));
    }

    /// Queue a read failure
    pub fn push_read_error(&self, reason: impl Into<String>) {
        self.inner
            .lock()
            .inbound
            .push_back(Err(ConnectionError::ReadFailed {
                reason: reason.into(),
            }));
    }

    /// Make every following write fail with `reason`, or succeed again with `None`
    pub fn set_write_failure(&self, reason: Option<&str>) {
        self.inner.lock().write_failure = reason.map(str::to_string);
    }

    /// Every successful write, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.inner.lock().written.clone()
    }

    /// Successful writes decoded as text
    pub fn written_text(&self) -> Vec<String> {
        self.inner
            .lock()
            .written
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Lines still waiting to be read
    pub fn pending_reads(&self) -> usize {
        self.inner.lock().inbound.len()
    }

    /// Number of read attempts made so far
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn read_line(&self) -> Result<Option<String>, ConnectionError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let next = self.inner.lock().inbound.pop_front();
        match next {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(e),
            None => {
                std::thread::sleep(self.read_timeout);
                Ok(None)
            }
        }
    }

    fn write_all(&self, data: &[u8]) -> Result<(), ConnectionError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.write_failure {
            return Err(ConnectionError::WriteFailed {
                reason: reason.clone(),
            });
        }
        inner.written.push(data.to_vec());
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Provider handing out [`MockTransport`]s for a fixed set of port names
#[derive(Default)]
pub struct MockProvider {
    inner: Mutex<MockProviderInner>,
}

#[derive(Default)]
struct MockProviderInner {
    ports: Vec<String>,
    busy: HashSet<String>,
    opened: Vec<MockTransport>,
    open_delay: Duration,
}

impl MockProvider {
    /// Provider exposing `ports`
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Mutex::new(MockProviderInner {
                ports: ports.into_iter().map(Into::into).collect(),
                ..Default::default()
            }),
        }
    }

    /// Make opening `port` fail as if another program held it
    pub fn set_busy(&self, port: &str, busy: bool) {
        let mut inner = self.inner.lock();
        if busy {
            inner.busy.insert(port.to_string());
        } else {
            inner.busy.remove(port);
        }
    }

    /// Make every open block for `delay`, like a slow OS open call
    pub fn set_open_delay(&self, delay: Duration) {
        self.inner.lock().open_delay = delay;
    }

    /// Transports opened so far, oldest first
    pub fn opened(&self) -> Vec<MockTransport> {
        self.inner.lock().opened.clone()
    }

    /// Most recently opened transport
    pub fn last_opened(&self) -> Option<MockTransport> {
        self.inner.lock().opened.last().cloned()
    }
}

impl TransportProvider for MockProvider {
    fn list_ports(&self) -> spiderbot_core::Result<Vec<SerialPortInfo>> {
        Ok(self
            .inner
            .lock()
            .ports
            .iter()
            .map(|p| SerialPortInfo::new(p, "Mock Serial"))
            .collect())
    }

    fn open(&self, params: &ConnectionParams) -> Result<TransportHandle, ConnectionError> {
        let delay = self.inner.lock().open_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut inner = self.inner.lock();
        if inner.busy.contains(&params.port) {
            let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "Access is denied.");
            return Err(super::serial::classify_open_error(&params.port, &err));
        }
        if !inner.ports.contains(&params.port) {
            return Err(ConnectionError::FailedToOpen {
                port: params.port.clone(),
                reason: "No such file or directory".to_string(),
            });
        }

        let transport = MockTransport::new(&params.port, params.read_timeout);
        inner.opened.push(transport.clone());
        Ok(Arc::new(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::BaudRate;

    #[test]
    fn test_scripted_reads_in_order() {
        let transport = MockTransport::new("mock", Duration::from_millis(1));
        transport.push_line("a");
        transport.push_read_error("glitch");
        transport.push_line("b");

        assert_eq!(transport.read_line().unwrap().as_deref(), Some("a"));
        assert!(transport.read_line().is_err());
        assert_eq!(transport.read_line().unwrap().as_deref(), Some("b"));
        assert_eq!(transport.read_line().unwrap(), None);
        assert_eq!(transport.read_count(), 4);
    }

    #[test]
    fn test_write_failure_injection() {
        let transport = MockTransport::new("mock", Duration::from_millis(1));
        transport.write_all(b"stop\r\n").unwrap();
        transport.set_write_failure(Some("broken pipe"));
        assert!(transport.write_all(b"left\r\n").is_err());
        assert_eq!(transport.written_text(), vec!["stop\r\n".to_string()]);
    }

    #[test]
    fn test_provider_busy_and_missing_ports() {
        let provider = MockProvider::new(["COM3"]);
        provider.set_busy("COM3", true);
        let busy = provider.open(&ConnectionParams::new("COM3", BaudRate::B9600));
        assert!(matches!(busy, Err(ConnectionError::PortBusy { .. })));

        let missing = provider.open(&ConnectionParams::new("COM9", BaudRate::B9600));
        assert!(matches!(missing, Err(ConnectionError::FailedToOpen { .. })));

        provider.set_busy("COM3", false);
        assert!(provider
            .open(&ConnectionParams::new("COM3", BaudRate::B9600))
            .is_ok());
        assert_eq!(provider.opened().len(), 1);
    }
}
