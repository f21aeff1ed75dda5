//! Outbound command vocabulary
//!
//! Motion commands are single words understood by the gait controller.
//! Any other operator text is sent as-is; the firmware echoes what it
//! received but never acknowledges.

use crate::communication::LINE_TERMINATOR;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Gait commands understood by the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionCommand {
    /// Walk forward
    Forward,
    /// Walk backward
    Back,
    /// Turn left
    Left,
    /// Turn right
    Right,
    /// Stand still
    Stop,
}

impl MotionCommand {
    /// All commands, in control-pad order
    pub const ALL: [MotionCommand; 5] = [
        MotionCommand::Forward,
        MotionCommand::Back,
        MotionCommand::Left,
        MotionCommand::Right,
        MotionCommand::Stop,
    ];

    /// Wire token
    pub fn as_str(self) -> &'static str {
        match self {
            MotionCommand::Forward => "forward",
            MotionCommand::Back => "back",
            MotionCommand::Left => "left",
            MotionCommand::Right => "right",
            MotionCommand::Stop => "stop",
        }
    }
}

impl std::fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(MotionCommand::Forward),
            "back" => Ok(MotionCommand::Back),
            "left" => Ok(MotionCommand::Left),
            "right" => Ok(MotionCommand::Right),
            "stop" => Ok(MotionCommand::Stop),
            other => Err(format!("Unknown motion command: {}", other)),
        }
    }
}

/// One outbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    text: String,
}

impl CommandFrame {
    /// Frame arbitrary text; a trailing terminator already present is not doubled
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = text.trim_end_matches(['\r', '\n']).to_string();
        Self { text }
    }

    /// Text without the terminator
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bytes to put on the wire
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.text.len() + LINE_TERMINATOR.len());
        bytes.extend_from_slice(self.text.as_bytes());
        bytes.extend_from_slice(LINE_TERMINATOR.as_bytes());
        bytes
    }
}

impl From<MotionCommand> for CommandFrame {
    fn from(command: MotionCommand) -> Self {
        CommandFrame::new(command.as_str())
    }
}
