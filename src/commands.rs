// src/commands.rs
//! Handlers behind the CLI subcommands. Each returns `Err` for the caller to
//! print; nothing here exits the process.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::Command as Process;

use anyhow::{bail, Context, Result};

use crate::bootstrap;
use crate::cache::ContentCache;
use crate::cli::{Command, Setting};
use crate::config::{Config, DataPaths};
use crate::daemon::{DaemonError, OsProcess, ProcessSupervisor};
use crate::store::SummaryStore;
use crate::view::{html_view, plain_view};

pub async fn dispatch(command: Command, paths: &DataPaths) -> Result<()> {
    match command {
        Command::Run => run(paths).await,
        Command::Start => start(paths),
        Command::Stop => stop(paths),
        Command::Status => status(paths),
        Command::Show { html } => show(paths, html),
        Command::Logs => logs(paths),
        Command::List => list(paths),
        Command::AddSource { url } => add_source(paths, &url),
        Command::RemSource { source } => rem_source(paths, &source),
        Command::Set { setting } => set(paths, setting),
        Command::ClearCache => clear_cache(paths),
        Command::ClearData => clear_data(paths),
        Command::DaemonChild => daemon_child(paths).await,
    }
}

fn load_config(paths: &DataPaths) -> Result<Config> {
    Config::load_or_init(paths.config_file())
}

fn supervisor(paths: &DataPaths) -> Result<ProcessSupervisor<OsProcess>> {
    let exe = env::current_exe().context("locating the nub executable")?;
    let child = OsProcess::new(
        exe,
        [
            OsStr::new("--config"),
            paths.config_file().as_os_str(),
            OsStr::new("--data-dir"),
            paths.data_dir().as_os_str(),
            OsStr::new("daemon-child"),
        ],
    );
    Ok(ProcessSupervisor::new(paths.pid_file(), paths.log_file(), child))
}

async fn run(paths: &DataPaths) -> Result<()> {
    let cfg = load_config(paths)?;
    println!("Starting crawl and summarization...");
    let report = bootstrap::run_once(&cfg, paths).await?;
    for (source, err) in report.failed() {
        println!("  ✗ {source}: {err:#}");
    }
    println!(
        "Done! {} of {} sources summarized",
        report.succeeded(),
        report.outcomes.len()
    );
    Ok(())
}

fn start(paths: &DataPaths) -> Result<()> {
    let cfg = load_config(paths)?;
    let sup = supervisor(paths)?;
    // A live daemon is reported as such even if the config has since broken.
    if let Some(pid) = sup.status() {
        return Err(DaemonError::AlreadyRunning { pid }.into());
    }
    cfg.validate()?;
    let pid = sup.start()?;
    println!("Daemon started successfully (PID: {pid})");
    println!("Logs: {}", sup.log_path().display());
    println!("Schedule: every {} minutes", cfg.schedule().as_secs() / 60);
    Ok(())
}

fn stop(paths: &DataPaths) -> Result<()> {
    let pid = supervisor(paths)?.stop()?;
    println!("Daemon stopped (PID: {pid})");
    Ok(())
}

fn status(paths: &DataPaths) -> Result<()> {
    match supervisor(paths)?.status() {
        Some(pid) => println!("Daemon running (PID: {pid})"),
        None => println!("Daemon not running"),
    }
    Ok(())
}

fn show(paths: &DataPaths, html: bool) -> Result<()> {
    let cfg = load_config(paths)?;
    let store = SummaryStore::from_paths(paths);
    let summaries = store.summaries()?;
    if summaries.is_empty() {
        println!("No summarizations found");
        return Ok(());
    }
    let focus_docs = if cfg.has_focus() {
        store.focus_documents()?
    } else {
        Vec::new()
    };

    if html {
        let file = paths.html_view_file();
        write_view(&file, &html_view(&summaries, &focus_docs, &cfg.focus_topics))?;
        println!("Opening summaries in browser...");
        println!("File: {}", file.display());
        open::that(&file).with_context(|| format!("opening {} in browser", file.display()))?;
    } else {
        let file = paths.plain_view_file();
        write_view(&file, &plain_view(&summaries, &focus_docs, &cfg.focus_topics))?;
        page(&file, &[])?;
    }
    Ok(())
}

fn write_view(file: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(file, contents).with_context(|| format!("writing {}", file.display()))
}

/// Open `file` in `$PAGER`, or `less` with `less_args` when unset.
fn page(file: &Path, less_args: &[&str]) -> Result<()> {
    let mut cmd = match env::var("PAGER").ok().filter(|p| !p.trim().is_empty()) {
        Some(pager) => Process::new(pager),
        None => {
            let mut less = Process::new("less");
            less.args(less_args);
            less
        }
    };
    let status = cmd
        .arg(file)
        .status()
        .with_context(|| format!("launching pager for {}", file.display()))?;
    if !status.success() {
        bail!("pager exited with {status}");
    }
    Ok(())
}

fn logs(paths: &DataPaths) -> Result<()> {
    let log = paths.log_file();
    if !log.exists() {
        println!("No logs found");
        return Ok(());
    }
    page(&log, &["+G"])
}

fn list(paths: &DataPaths) -> Result<()> {
    let cfg = load_config(paths)?;
    if cfg.sources.is_empty() {
        println!("No sources configured");
        return Ok(());
    }
    println!("Sources:");
    for (i, source) in cfg.sources.iter().enumerate() {
        println!("  [{}] {}", i + 1, source);
    }
    Ok(())
}

fn add_source(paths: &DataPaths, url: &str) -> Result<()> {
    let mut cfg = load_config(paths)?;
    cfg.add_source(url)?;
    cfg.save_to(paths.config_file())?;
    println!("Source added: {}", url.trim());
    Ok(())
}

fn rem_source(paths: &DataPaths, id_or_url: &str) -> Result<()> {
    let mut cfg = load_config(paths)?;
    let removed = cfg.remove_source(id_or_url)?;
    cfg.save_to(paths.config_file())?;
    println!("Source removed: {removed}");
    Ok(())
}

fn set(paths: &DataPaths, setting: Setting) -> Result<()> {
    let mut cfg = load_config(paths)?;
    let message = apply_setting(&mut cfg, setting);
    cfg.save_to(paths.config_file())?;
    println!("{message}");
    Ok(())
}

/// Mutate the config and return the confirmation line.
pub fn apply_setting(cfg: &mut Config, setting: Setting) -> String {
    match setting {
        Setting::LlmApiKey { value } => {
            cfg.llm_api_key = value;
            "LLM API key set successfully".to_string()
        }
        Setting::LlmApiUrl { value } => {
            cfg.llm_api_url = value;
            "LLM API URL set successfully".to_string()
        }
        Setting::LlmApiModel { value } => {
            cfg.llm_api_model = value;
            "LLM API model set successfully".to_string()
        }
        Setting::Schedule { minutes } => {
            cfg.schedule_minutes = minutes;
            format!("Schedule time set to {minutes} minutes")
        }
        Setting::Prompt { value } => {
            cfg.summary_prompt = value;
            "Summary prompt set successfully".to_string()
        }
        Setting::Focus { value } => {
            cfg.focus_topics = value.trim().to_string();
            if cfg.focus_topics.is_empty() {
                "Focus topics cleared".to_string()
            } else {
                format!("Focus topics set to: {}", cfg.focus_topics)
            }
        }
    }
}

fn clear_cache(paths: &DataPaths) -> Result<()> {
    ContentCache::new(paths.cache_dir()).clear()?;
    println!("Cache cleared successfully");
    Ok(())
}

fn clear_data(paths: &DataPaths) -> Result<()> {
    if let Some(pid) = supervisor(paths)?.status() {
        bail!("daemon is running (PID: {pid}), stop it first");
    }
    if paths.clear_all()? {
        println!("Removed: {}", paths.data_dir().display());
    }
    println!("All data cleared successfully");
    Ok(())
}

async fn daemon_child(paths: &DataPaths) -> Result<()> {
    let cfg = Config::load_from_file(paths.config_file())?;
    bootstrap::daemon_main(cfg, paths.clone()).await;
    Ok(())
}
