//! Operator console
//!
//! Line-oriented front end over the link manager and the poll cycle. Every
//! line typed by the operator becomes one [`OperatorCommand`].

use crate::poll::PollCycle;
use parking_lot::Mutex;
use spiderbot_communication::{BaudRate, LinkManager, MotionCommand};
use spiderbot_core::{LogSink, MessageLog, SnapshotWriter};
use std::sync::Arc;

/// One parsed operator line
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    /// List serial ports
    Ports,
    /// Open a port, replacing any current link
    Connect { port: String, baud: BaudRate },
    /// Close the link
    Disconnect,
    /// Show link state and the latest reading
    Status,
    /// Save the latest frames and distance
    Snapshot,
    /// Leave the console
    Quit,
    /// Gait command
    Motion(MotionCommand),
    /// Free text sent as one line
    Send(String),
}

impl OperatorCommand {
    /// Parse an operator line; blank lines yield `Ok(None)`
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "ports" => OperatorCommand::Ports,
            "disconnect" => OperatorCommand::Disconnect,
            "status" => OperatorCommand::Status,
            "snapshot" => OperatorCommand::Snapshot,
            "quit" | "exit" => OperatorCommand::Quit,
            "say" if !rest.is_empty() => OperatorCommand::Send(rest.to_string()),
            "connect" => {
                let mut args = rest.split_whitespace();
                let port = args
                    .next()
                    .ok_or_else(|| "usage: connect <port> [baud]".to_string())?;
                let baud = match args.next() {
                    Some(baud) => baud.parse::<BaudRate>().map_err(|e| e.to_string())?,
                    None => BaudRate::default(),
                };
                OperatorCommand::Connect {
                    port: port.to_string(),
                    baud,
                }
            }
            _ => match line.parse::<MotionCommand>() {
                Ok(motion) => OperatorCommand::Motion(motion),
                Err(_) => OperatorCommand::Send(line.to_string()),
            },
        };

        Ok(Some(command))
    }
}

/// Result of running one command
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Keep reading; print these lines
    Continue(Vec<String>),
    /// Stop the console
    Quit,
}

/// Log sink that records into a [`MessageLog`] and echoes to stdout
pub struct EchoSink {
    log: Arc<MessageLog>,
}

impl EchoSink {
    /// Echo sink recording into `log`
    pub fn new(log: Arc<MessageLog>) -> Self {
        Self { log }
    }
}

impl LogSink for EchoSink {
    fn log(&self, message: &str) {
        self.log.push(message);
        println!("{}", message);
    }
}

/// Binds the operator commands to the link and the poll cycle
pub struct Console {
    link: Arc<LinkManager>,
    poll: Arc<Mutex<PollCycle>>,
    snapshots: SnapshotWriter,
}

impl Console {
    /// Console driving `link`; snapshots take frames from `poll`
    pub fn new(
        link: Arc<LinkManager>,
        poll: Arc<Mutex<PollCycle>>,
        snapshots: SnapshotWriter,
    ) -> Self {
        Self {
            link,
            poll,
            snapshots,
        }
    }

    /// Run one command. Blocks while a link is opened or closed.
    pub fn execute(&self, command: OperatorCommand) -> Flow {
        let lines = match command {
            OperatorCommand::Quit => {
                self.link.disconnect();
                return Flow::Quit;
            }
            OperatorCommand::Ports => {
                let ports = self.link.list_port_info();
                if ports.is_empty() {
                    vec!["No serial ports found".to_string()]
                } else {
                    ports.iter().map(ToString::to_string).collect()
                }
            }
            OperatorCommand::Connect { port, baud } => match self.link.connect(&port, baud) {
                Ok(message) => vec![message],
                Err(e) => vec![e.user_message()],
            },
            OperatorCommand::Disconnect => {
                self.link.disconnect();
                vec!["Disconnected".to_string()]
            }
            OperatorCommand::Status => {
                let port = self.link.port_name().unwrap_or_else(|| "-".to_string());
                let mut lines = vec![
                    format!("State: {} ({})", self.link.state(), port),
                    format!("Distance: {:.1} cm", self.link.get_distance()),
                ];
                if let Some(failure) = self.link.last_failure() {
                    lines.push(format!("Last failure: {}", failure));
                }
                lines
            }
            OperatorCommand::Snapshot => match self.poll.lock().save_snapshot(&self.snapshots) {
                Ok(snapshot) => vec![format!(
                    "Snapshot {} saved to {}",
                    snapshot.timestamp,
                    self.snapshots.directory().display()
                )],
                Err(e) => {
                    tracing::error!("Snapshot failed: {}", e);
                    vec![format!("Snapshot failed: {}", e)]
                }
            },
            OperatorCommand::Motion(motion) => self.refused(self.link.send_motion(motion)),
            OperatorCommand::Send(text) => self.refused(self.link.send_command(&text)),
        };

        Flow::Continue(lines)
    }

    fn refused(&self, sent: bool) -> Vec<String> {
        if sent || self.link.is_connected() {
            Vec::new()
        } else {
            vec!["Not connected".to_string()]
        }
    }
}
