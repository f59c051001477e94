// src/daemon/mod.rs
//! Background execution: PID file, process supervision, periodic loop.

pub mod pidfile;
pub mod scheduler;
pub mod supervisor;

use std::io;
use std::path::PathBuf;

pub use pidfile::PidFile;
pub use supervisor::{OsProcess, ProcessControl, ProcessSupervisor};

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("daemon already running (PID: {pid})")]
    AlreadyRunning { pid: u32 },
    #[error("daemon is not running")]
    NotRunning,
    #[error("failed to open log file {}: {source}", .path.display())]
    LogFile { path: PathBuf, source: io::Error },
    #[error("failed to start daemon: {0}")]
    Spawn(#[source] io::Error),
    #[error("failed to write PID file: {0}")]
    PidFile(#[source] io::Error),
    #[error("failed to stop daemon (PID: {pid}): {source}")]
    Signal { pid: u32, source: io::Error },
}
