// src/cli.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::paths::{ENV_CONFIG_PATH, ENV_DATA_DIR};

#[derive(Debug, Parser)]
#[command(name = "nub", version, about = "Crawl sites on a schedule and keep LLM summaries of them")]
pub struct Cli {
    /// Config file (default ~/.config/nub/config.json)
    #[arg(long, global = true, env = ENV_CONFIG_PATH)]
    pub config: Option<PathBuf>,

    /// Data directory (default ~/.local/nub)
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one crawl and summarization pass in the foreground
    Run,
    /// Start the background daemon
    Start,
    /// Stop the background daemon
    Stop,
    /// Show whether the daemon is running
    Status,
    /// Show stored summaries
    Show {
        /// Render to HTML and open in the browser
        #[arg(long)]
        html: bool,
    },
    /// Page through the daemon log
    Logs,
    /// List configured sources
    List,
    /// Add a source URL
    AddSource { url: String },
    /// Remove a source by list index or URL
    RemSource { source: String },
    /// Change a setting
    Set {
        #[command(subcommand)]
        setting: Setting,
    },
    /// Delete cached page content
    ClearCache,
    /// Delete cache, summaries, focus documents, PID and log
    ClearData,
    #[command(hide = true)]
    DaemonChild,
}

#[derive(Debug, Subcommand)]
pub enum Setting {
    /// API key, or ENV to read NUB_LLM_API_KEY at run time
    LlmApiKey { value: String },
    LlmApiUrl { value: String },
    LlmApiModel { value: String },
    /// Minutes between daemon runs
    Schedule { minutes: u64 },
    /// Summary prompt template
    Prompt { value: String },
    /// Comma-separated focus topics; empty string disables focus
    Focus { value: String },
}
