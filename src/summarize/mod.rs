// src/summarize/mod.rs
//! Summarizer abstraction + prompt construction.

pub mod chat;

use anyhow::Result;
use async_trait::async_trait;

pub use chat::ChatCompletionsSummarizer;

/// What focus extraction answers when nothing matches the topics.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content found.";

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize page text. `prompt` is the operator's summary instruction.
    async fn summarize(&self, text: &str, source: &str, prompt: &str) -> Result<String>;

    /// Pull topic-related items out of `body`. Empty `topics` → empty result.
    async fn extract_focused(&self, topics: &str, body: &str) -> Result<String>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// True when a focus result should be stored (non-empty and not the sentinel).
pub fn is_storable_focus(focused: &str) -> bool {
    let t = focused.trim();
    !t.is_empty() && t != NO_RELEVANT_CONTENT
}

pub fn summary_prompt(prompt: &str, source: &str, text: &str) -> String {
    let prompt = if prompt.trim().is_empty() {
        crate::config::app::DEFAULT_SUMMARY_PROMPT
    } else {
        prompt
    };
    format!(
        "{prompt}\n\nWebsite URL: {source}\n\nContent:\n{text}\n\nFormat your response in clean markdown with headings, bullet points, and clear structure."
    )
}

pub fn focus_prompt(topics: &str, body: &str) -> String {
    format!(
        "Extract only the content related to these topics: {topics}\n\nFrom this summary, extract and list ONLY the items that are directly related to the specified topics. Return them as a bullet list in markdown format. If there are no relevant items, return \"{NO_RELEVANT_CONTENT}\"\n\nSummary:\n{body}"
    )
}
