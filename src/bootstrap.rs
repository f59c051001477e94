// src/bootstrap.rs
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use crate::cache::ContentCache;
use crate::config::{Config, DataPaths};
use crate::daemon::scheduler::{effective_interval, run_until, shutdown_signal};
use crate::fetch::HttpFetcher;
use crate::pipeline::{RunReport, RunSettings, SourcePipeline};
use crate::store::SummaryStore;
use crate::summarize::{ChatCompletionsSummarizer, Summarizer};

/// Wire the HTTP fetcher and chat-completions summarizer to the data layout.
pub fn build_pipeline(cfg: &Config, paths: &DataPaths) -> Result<SourcePipeline> {
    let fetcher = Arc::new(HttpFetcher::new()?);
    let summarizer = Arc::new(ChatCompletionsSummarizer::from_config(cfg)?);
    info!(
        summarizer = summarizer.name(),
        model = %cfg.llm_api_model,
        focus = cfg.has_focus(),
        key_len = cfg.llm_api_key.len(),
        "pipeline configured"
    );
    Ok(SourcePipeline::new(
        ContentCache::new(paths.cache_dir()),
        SummaryStore::from_paths(paths),
        fetcher,
        summarizer,
        RunSettings::from_config(cfg),
    ))
}

/// One foreground pass. An invalid config fails before any source is touched.
pub async fn run_once(cfg: &Config, paths: &DataPaths) -> Result<RunReport> {
    cfg.validate()?;
    let pipeline = build_pipeline(cfg, paths)?;
    Ok(pipeline.run(&cfg.sources).await)
}

/// Body of the detached process: run now, then on every tick until signalled.
pub async fn daemon_main(cfg: Config, paths: DataPaths) {
    let every = effective_interval(cfg.schedule());
    info!(
        pid = std::process::id(),
        minutes = every.as_secs() / 60,
        "daemon started, crawling every {} minutes",
        every.as_secs() / 60
    );

    let cfg = &cfg;
    let paths = &paths;
    run_until(
        every,
        || async move {
            match run_once(cfg, paths).await {
                Ok(report) => {
                    info!(
                        succeeded = report.succeeded(),
                        combined_focus = report.combined_focus_written,
                        "scheduled run complete"
                    );
                }
                Err(e) => error!(error = %format!("{e:#}"), "scheduled run skipped"),
            }
        },
        shutdown_signal(),
    )
    .await;

    info!("daemon stopped");
}
