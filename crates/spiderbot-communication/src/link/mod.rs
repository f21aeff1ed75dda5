//! Connection lifecycle: the link manager and its per-connection reader loop.

pub mod manager;
pub mod reader;

pub use manager::LinkManager;
pub use reader::{dispatch_line, IDLE_BACKOFF};
