// src/config/mod.rs
//! Configuration file handling and on-disk path resolution.

pub mod app;
pub mod paths;

pub use app::{Config, ConfigError};
pub use paths::DataPaths;
