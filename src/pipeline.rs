// src/pipeline.rs
//! Per-source pipeline and the run-level fold.
//!
//! For each source, in order: cache lookup → fetch on miss → cache write →
//! summarize → store summary → (optional) focus extraction → store focus.
//! A failure in the first five steps fails that source only. Focus work is
//! best-effort: failures are logged and the source still counts as done.
//! After every source has been attempted, successful summaries can be folded
//! into one combined focus document.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::ContentCache;
use crate::config::Config;
use crate::extract::prepare_for_summary;
use crate::fetch::Fetcher;
use crate::store::SummaryStore;
use crate::summarize::{is_storable_focus, Summarizer};

/// Joins per-source summaries before combined focus extraction.
pub const SUMMARY_SEPARATOR: &str = "\n\n---\n\n";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_sources_total", "Sources attempted by runs.");
        describe_counter!(
            "pipeline_source_errors_total",
            "Sources that failed before their summary was stored."
        );
        describe_counter!("content_cache_hits_total", "Fresh cache entries reused.");
        describe_counter!(
            "content_cache_misses_total",
            "Cache misses that triggered a fetch."
        );
        describe_counter!(
            "focus_documents_total",
            "Focus documents written (per-source and combined)."
        );
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the last run finished.");
    });
}

/// Prompt + focus settings a run needs, taken from the config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    pub summary_prompt: String,
    pub focus_topics: String,
}

impl RunSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            summary_prompt: cfg.summary_prompt.clone(),
            focus_topics: cfg.focus_topics.trim().to_string(),
        }
    }

    fn has_focus(&self) -> bool {
        !self.focus_topics.is_empty()
    }
}

#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<String>,
}

/// Result of one pass over the configured sources.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<SourceOutcome>,
    pub combined_focus_written: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &anyhow::Error)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.source.as_str(), e)),
        })
    }

    /// Successful summaries in source order.
    pub fn summaries(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(String::as_str))
            .collect()
    }
}

pub struct SourcePipeline {
    cache: ContentCache,
    store: SummaryStore,
    fetcher: Arc<dyn Fetcher>,
    summarizer: Arc<dyn Summarizer>,
    settings: RunSettings,
}

impl SourcePipeline {
    pub fn new(
        cache: ContentCache,
        store: SummaryStore,
        fetcher: Arc<dyn Fetcher>,
        summarizer: Arc<dyn Summarizer>,
        settings: RunSettings,
    ) -> Self {
        Self {
            cache,
            store,
            fetcher,
            summarizer,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Attempt every source in order, then run the combined focus step.
    pub async fn run(&self, sources: &[String]) -> RunReport {
        ensure_metrics_described();
        info!(sources = sources.len(), "starting crawl and summarization");

        let mut report = RunReport::default();
        for source in sources {
            counter!("pipeline_sources_total").increment(1);
            let result = self.process_source(source).await;
            if let Err(e) = &result {
                counter!("pipeline_source_errors_total").increment(1);
                warn!(source = %source, error = %format!("{e:#}"), "error processing source");
            }
            report.outcomes.push(SourceOutcome {
                source: source.clone(),
                result,
            });
        }

        report.combined_focus_written = self.aggregate_focus(&report.summaries()).await;

        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        info!(
            succeeded = report.succeeded(),
            failed = report.outcomes.len() - report.succeeded(),
            "run finished"
        );
        report
    }

    /// Steps 1–4 for one source. Returns the summary text.
    pub async fn process_source(&self, source: &str) -> Result<String> {
        info!(source = %source, "processing");

        let content = self.load_content(source).await?;

        info!(source = %source, "summarizing");
        let text = prepare_for_summary(&content);
        let summary = self
            .summarizer
            .summarize(&text, source, &self.settings.summary_prompt)
            .await
            .with_context(|| format!("summarizing with {}", self.summarizer.name()))?;

        self.store
            .put_summary(source, &summary)
            .context("storing summary")?;

        if self.settings.has_focus() {
            self.enrich_focus(source, &summary).await;
        }

        info!(source = %source, "completed");
        Ok(summary)
    }

    /// Cache-aside read; a fetched body is cached before anything else uses it.
    async fn load_content(&self, source: &str) -> Result<String> {
        if let Some(cached) = self.cache.lookup(source)? {
            counter!("content_cache_hits_total").increment(1);
            debug!(source = %source, "using cached content");
            return Ok(cached);
        }

        counter!("content_cache_misses_total").increment(1);
        info!(source = %source, "crawling");
        let content = self.fetcher.fetch(source).await.context("fetching")?;
        self.cache
            .store(source, &content)
            .context("caching fetched content")?;
        Ok(content)
    }

    async fn enrich_focus(&self, source: &str, summary: &str) {
        let focused = match self
            .summarizer
            .extract_focused(&self.settings.focus_topics, summary)
            .await
        {
            Ok(f) => f,
            Err(e) => {
                warn!(source = %source, error = %format!("{e:#}"), "failed to extract focused content");
                return;
            }
        };
        if !is_storable_focus(&focused) {
            debug!(source = %source, "no focused content");
            return;
        }
        match self.store.put_focus(source, &focused) {
            Ok(()) => counter!("focus_documents_total").increment(1),
            Err(e) => {
                warn!(source = %source, error = %format!("{e:#}"), "failed to store focused content");
            }
        }
    }

    /// Second, independent extraction over all summaries of this run.
    async fn aggregate_focus(&self, summaries: &[&str]) -> bool {
        if !self.settings.has_focus() || summaries.is_empty() {
            return false;
        }

        info!(summaries = summaries.len(), "extracting focused content from all summaries");
        let combined = summaries.join(SUMMARY_SEPARATOR);
        let focused = match self
            .summarizer
            .extract_focused(&self.settings.focus_topics, &combined)
            .await
        {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "failed to extract combined focused content");
                return false;
            }
        };
        if !is_storable_focus(&focused) {
            return false;
        }
        match self.store.put_combined_focus(&focused) {
            Ok(()) => {
                counter!("focus_documents_total").increment(1);
                true
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "failed to store combined focused content");
                false
            }
        }
    }
}
