//! Playlist Export Daemon
//!
//! Composition roots for the two processes of the pipeline. The binaries in
//! `src/bin` only read configuration, install telemetry and call into
//! [`bootstrap`].

pub mod bootstrap;
pub mod config;
pub mod telemetry;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
