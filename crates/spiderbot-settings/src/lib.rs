//! SpiderBot Settings Crate
//!
//! Handles console configuration and settings persistence.

pub mod config;
pub mod error;

pub use config::{
    Config, ConnectionSettings, FrameSettings, PollSettings, SnapshotSettings, APP_DIR_NAME,
};
pub use error::{SettingsError, SettingsResult};
