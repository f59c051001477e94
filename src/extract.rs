// src/extract.rs
//! HTML → plain text for summarization requests.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Request-size bound for the summarizer, in characters.
pub const MAX_CONTENT_CHARS: usize = 8000;

/// Strip scripts, styles and tags; keep trimmed lines longer than 3 chars.
pub fn extract_text(html: &str) -> String {
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS.get_or_init(|| {
        // An unclosed block runs to the end of the document.
        Regex::new(r"(?is)<script\b.*?(?:</script\s*>|\z)|<style\b.*?(?:</style\s*>|\z)").unwrap()
    });
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());

    let without_blocks = re_blocks.replace_all(html, "\n");
    let without_tags = re_tags.replace_all(&without_blocks, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);

    decoded
        .lines()
        .map(str::trim)
        .filter(|l| l.chars().count() > 3)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hard cut at `max` characters (never splits a UTF-8 sequence).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extraction plus truncation, as submitted to the summarizer.
pub fn prepare_for_summary(html: &str) -> String {
    let text = extract_text(html);
    truncate_chars(&text, MAX_CONTENT_CHARS).to_string()
}
