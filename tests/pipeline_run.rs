// tests/pipeline_run.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use nub::cache::ContentCache;
use nub::extract::MAX_CONTENT_CHARS;
use nub::pipeline::{RunSettings, SourcePipeline};
use nub::store::SummaryStore;
use nub::summarize::{Summarizer, NO_RELEVANT_CONTENT};
use nub::fetch::Fetcher;

#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, source: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(source)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404: Not Found"))
    }
}

/// Echoes input; focus extraction keeps lines mentioning a topic.
#[derive(Default)]
struct EchoSummarizer {
    texts: Mutex<Vec<String>>,
    focus_calls: AtomicUsize,
    fail_focus: bool,
    fail_summary: bool,
}

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, text: &str, source: &str, _prompt: &str) -> Result<String> {
        if self.fail_summary {
            bail!("LLM API error 401: bad key");
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(format!("- {source}: {}", text.lines().next().unwrap_or_default()))
    }

    async fn extract_focused(&self, topics: &str, body: &str) -> Result<String> {
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_focus {
            bail!("LLM API error 500: boom");
        }
        let hits: Vec<&str> = body
            .lines()
            .filter(|l| topics.split(',').any(|t| l.contains(t.trim())))
            .collect();
        if hits.is_empty() {
            Ok(NO_RELEVANT_CONTENT.to_string())
        } else {
            Ok(hits.join("\n"))
        }
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

struct Harness {
    _tmp: tempfile::TempDir,
    cache: ContentCache,
    store: SummaryStore,
}

impl Harness {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(tmp.path().join("cache"));
        let store = SummaryStore::new(tmp.path().join("summaries"), tmp.path().join("focus"));
        Self {
            _tmp: tmp,
            cache,
            store,
        }
    }

    fn pipeline(
        &self,
        fetcher: Arc<MapFetcher>,
        summarizer: Arc<EchoSummarizer>,
        focus: &str,
    ) -> SourcePipeline {
        SourcePipeline::new(
            self.cache.clone(),
            self.store.clone(),
            fetcher,
            summarizer,
            RunSettings {
                summary_prompt: "Summarize.".into(),
                focus_topics: focus.into(),
            },
        )
    }
}

fn sources(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn failing_source_does_not_stop_the_others() {
    let h = Harness::new();
    let fetcher = Arc::new(MapFetcher::with(&[
        ("https://a.example", "<p>alpha news today</p>"),
        ("https://c.example", "<p>gamma news today</p>"),
    ]));
    let summarizer = Arc::new(EchoSummarizer::default());
    let p = h.pipeline(fetcher, summarizer, "");

    let report = p
        .run(&sources(&["https://a.example", "https://b.example", "https://c.example"]))
        .await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded(), 2);
    let failed: Vec<&str> = report.failed().map(|(s, _)| s).collect();
    assert_eq!(failed, vec!["https://b.example"]);

    assert!(h.store.summary_path("https://a.example").exists());
    assert!(!h.store.summary_path("https://b.example").exists());
    assert!(h.store.summary_path("https://c.example").exists());
    assert!(!h.cache.path_for("https://b.example").exists());
}

#[tokio::test]
async fn run_without_focus_writes_only_summaries() {
    let h = Harness::new();
    let fetcher = Arc::new(MapFetcher::with(&[
        ("https://a.example", "<p>security patch released</p>"),
        ("https://b.example", "<p>weather is sunny</p>"),
    ]));
    let summarizer = Arc::new(EchoSummarizer::default());
    let p = h.pipeline(fetcher, summarizer.clone(), "");

    let report = p.run(&sources(&["https://a.example", "https://b.example"])).await;

    assert_eq!(report.succeeded(), 2);
    assert!(!report.combined_focus_written);
    assert_eq!(h.store.summaries().unwrap().len(), 2);
    assert!(h.store.focus_documents().unwrap().is_empty());
    assert!(!h.store.combined_focus_path().exists());
    assert_eq!(summarizer.focus_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn focus_topics_produce_per_source_and_combined_documents() {
    let h = Harness::new();
    let fetcher = Arc::new(MapFetcher::with(&[
        ("https://a.example", "<p>security patch released</p>"),
        ("https://b.example", "<p>new security advisory</p>"),
    ]));
    let summarizer = Arc::new(EchoSummarizer::default());
    let p = h.pipeline(fetcher, summarizer.clone(), "security");

    let report = p.run(&sources(&["https://a.example", "https://b.example"])).await;

    assert!(report.combined_focus_written);
    assert!(h.store.focus_path("https://a.example").exists());
    assert!(h.store.focus_path("https://b.example").exists());
    // Two per-source documents plus combined.md.
    assert_eq!(h.store.focus_documents().unwrap().len(), 3);
    // One extraction per source and one over the joined summaries.
    assert_eq!(summarizer.focus_calls.load(Ordering::SeqCst), 3);

    let combined = std::fs::read_to_string(h.store.combined_focus_path()).unwrap();
    assert!(combined.starts_with("# Combined Focus Summary"));
    assert!(combined.contains("security patch released"));
    assert!(combined.contains("new security advisory"));
    assert_eq!(
        h.store.get_focus("https://a.example").unwrap(),
        "- https://a.example: security patch released"
    );
}

#[tokio::test]
async fn sentinel_answers_are_not_stored() {
    let h = Harness::new();
    let fetcher = Arc::new(MapFetcher::with(&[(
        "https://a.example",
        "<p>weather is sunny</p>",
    )]));
    let summarizer = Arc::new(EchoSummarizer::default());
    let p = h.pipeline(fetcher, summarizer, "security");

    let report = p.run(&sources(&["https://a.example"])).await;

    assert_eq!(report.succeeded(), 1);
    assert!(!report.combined_focus_written);
    assert!(!h.store.focus_path("https://a.example").exists());
    assert!(!h.store.combined_focus_path().exists());
    assert_eq!(h.store.get_focus("https://a.example").unwrap(), "");
}

#[tokio::test]
async fn fresh_cache_entry_skips_fetch() {
    let h = Harness::new();
    h.cache
        .store("https://a.example", "<p>cached headline here</p>")
        .unwrap();
    let fetcher = Arc::new(MapFetcher::default());
    let summarizer = Arc::new(EchoSummarizer::default());
    let p = h.pipeline(fetcher.clone(), summarizer.clone(), "");

    let report = p.run(&sources(&["https://a.example"])).await;

    assert_eq!(report.succeeded(), 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        summarizer.texts.lock().unwrap().as_slice(),
        &["cached headline here".to_string()]
    );
}

#[tokio::test]
async fn fetched_content_is_cached_and_text_is_truncated() {
    let h = Harness::new();
    let long_line = "x".repeat(MAX_CONTENT_CHARS + 500);
    let page = format!("<html><script>var s = 1;</script><p>{long_line}</p></html>");
    let fetcher = Arc::new(MapFetcher::with(&[("https://a.example", page.as_str())]));
    let summarizer = Arc::new(EchoSummarizer::default());
    let p = h.pipeline(fetcher.clone(), summarizer.clone(), "");

    p.run(&sources(&["https://a.example"])).await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.cache.lookup("https://a.example").unwrap().as_deref(),
        Some(page.as_str())
    );
    let texts = summarizer.texts.lock().unwrap();
    assert_eq!(texts[0].chars().count(), MAX_CONTENT_CHARS);
    assert!(!texts[0].contains("var s"));
}

#[tokio::test]
async fn focus_failure_keeps_the_summary() {
    let h = Harness::new();
    let fetcher = Arc::new(MapFetcher::with(&[(
        "https://a.example",
        "<p>security patch released</p>",
    )]));
    let summarizer = Arc::new(EchoSummarizer {
        fail_focus: true,
        ..EchoSummarizer::default()
    });
    let p = h.pipeline(fetcher, summarizer, "security");

    let report = p.run(&sources(&["https://a.example"])).await;

    assert_eq!(report.succeeded(), 1);
    assert!(!report.combined_focus_written);
    assert!(h.store.summary_path("https://a.example").exists());
    assert!(!h.store.focus_path("https://a.example").exists());
}

#[tokio::test]
async fn summarizer_failure_names_the_summarizer_and_keeps_the_cache() {
    let h = Harness::new();
    let fetcher = Arc::new(MapFetcher::with(&[(
        "https://a.example",
        "<p>security patch released</p>",
    )]));
    let summarizer = Arc::new(EchoSummarizer {
        fail_summary: true,
        ..EchoSummarizer::default()
    });
    let p = h.pipeline(fetcher, summarizer, "");

    let report = p.run(&sources(&["https://a.example"])).await;

    assert_eq!(report.succeeded(), 0);
    let (_, err) = report.failed().next().unwrap();
    let msg = format!("{err:#}");
    assert!(msg.contains("summarizing with echo"), "{msg}");
    assert!(msg.contains("401"), "{msg}");
    assert!(h.cache.path_for("https://a.example").exists());
    assert!(!h.store.summary_path("https://a.example").exists());
}
