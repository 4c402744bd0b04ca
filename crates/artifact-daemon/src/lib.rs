//! artifact-daemon library: Exposes internal modules for testing.
//!
//! This is a thin library layer over the daemon components,
//! allowing integration tests to access internal types.

pub mod config;
pub mod daemon;
pub mod message;
pub mod store;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use daemon::Daemon;
pub use message::{Command, LineReader, Output, ProtocolError, MAX_LINE_SIZE};
pub use store::FileStore;
