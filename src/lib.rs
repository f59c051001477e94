// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod cache;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod store;
pub mod summarize;

pub mod pipeline;

// Background execution (PID file, supervisor, scheduler loop)
pub mod daemon;

// Viewing stored documents
pub mod render;
pub mod view;

// Command surface
pub mod bootstrap;
pub mod cli;
pub mod commands;

// ---- Re-exports for stable public API ----
pub use crate::cache::ContentCache;
pub use crate::config::{Config, ConfigError, DataPaths};
pub use crate::daemon::DaemonError;
pub use crate::pipeline::{RunReport, SourcePipeline};
pub use crate::store::SummaryStore;
