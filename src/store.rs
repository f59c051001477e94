// src/store.rs
//! Summary and focus documents on disk.
//!
//! `summaries/<key>.md` and `focus/<key>.md` use the same key as the content
//! cache; `focus/combined.md` holds the cross-source excerpt. Every put
//! overwrites, there is no history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat};

use crate::cache::{source_key, write_then_rename};
use crate::config::DataPaths;

pub const COMBINED_FOCUS_FILE: &str = "combined.md";

#[derive(Debug, Clone)]
pub struct SummaryStore {
    summaries_dir: PathBuf,
    focus_dir: PathBuf,
}

impl SummaryStore {
    pub fn new(summaries_dir: impl Into<PathBuf>, focus_dir: impl Into<PathBuf>) -> Self {
        Self {
            summaries_dir: summaries_dir.into(),
            focus_dir: focus_dir.into(),
        }
    }

    pub fn from_paths(paths: &DataPaths) -> Self {
        Self::new(paths.summaries_dir(), paths.focus_dir())
    }

    pub fn summary_path(&self, source: &str) -> PathBuf {
        self.summaries_dir.join(format!("{}.md", source_key(source)))
    }

    pub fn focus_path(&self, source: &str) -> PathBuf {
        self.focus_dir.join(format!("{}.md", source_key(source)))
    }

    pub fn combined_focus_path(&self) -> PathBuf {
        self.focus_dir.join(COMBINED_FOCUS_FILE)
    }

    pub fn put_summary(&self, source: &str, summary: &str) -> Result<()> {
        self.put_summary_at(source, summary, Local::now())
    }

    pub fn put_summary_at(&self, source: &str, summary: &str, generated: DateTime<Local>) -> Result<()> {
        let doc = format!(
            "# Summary for: {source}\n\nGenerated: {}\n\n---\n\n{summary}\n",
            rfc3339(generated)
        );
        write_doc(&self.summaries_dir, &self.summary_path(source), &doc)
    }

    /// Stores the excerpt as-is, without a header.
    pub fn put_focus(&self, source: &str, focused: &str) -> Result<()> {
        write_doc(&self.focus_dir, &self.focus_path(source), focused)
    }

    pub fn put_combined_focus(&self, focused: &str) -> Result<()> {
        let doc = format!(
            "# Combined Focus Summary\n\nGenerated: {}\n\n---\n\n{focused}\n",
            rfc3339(Local::now())
        );
        write_doc(&self.focus_dir, &self.combined_focus_path(), &doc)
    }

    /// Focus excerpt for a source; empty when none has been stored yet.
    pub fn get_focus(&self, source: &str) -> Result<String> {
        let path = self.focus_path(source);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("reading focus {}", path.display())),
        }
    }

    /// All summary documents, ordered by file name.
    pub fn summaries(&self) -> Result<Vec<String>> {
        read_markdown_dir(&self.summaries_dir)
    }

    /// All focus documents (per-source and combined), ordered by file name.
    pub fn focus_documents(&self) -> Result<Vec<String>> {
        read_markdown_dir(&self.focus_dir)
    }
}

fn rfc3339(ts: DateTime<Local>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_doc(dir: &Path, path: &Path, body: &str) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let tmp = path.with_extension("md.tmp");
    write_then_rename(&tmp, path, body.as_bytes())
        .with_context(|| format!("writing {}", path.display()))
}

fn read_markdown_dir(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("md"))
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for p in paths {
        // Skip unreadable files rather than failing the whole view.
        match fs::read_to_string(&p) {
            Ok(s) => docs.push(s),
            Err(e) => tracing::warn!(path = %p.display(), error = %e, "skipping unreadable document"),
        }
    }
    Ok(docs)
}
