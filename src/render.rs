// src/render.rs
//! Markdown → HTML and Markdown → wrapped plain text.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Column limit for the plain-text view.
pub const WRAP_WIDTH: usize = 78;

fn options() -> Options {
    let mut o = Options::empty();
    o.insert(Options::ENABLE_TABLES);
    o.insert(Options::ENABLE_STRIKETHROUGH);
    o
}

pub fn markdown_to_html(md: &str) -> String {
    let mut out = String::with_capacity(md.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(md, options()));
    out
}

/// Text content only: markup removed, block boundaries kept as line breaks.
pub fn strip_markdown(md: &str) -> String {
    let mut out = String::with_capacity(md.len());
    for ev in Parser::new_ext(md, options()) {
        match ev {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Start(Tag::List(_)) => end_line(&mut out),
            Event::Start(Tag::Item) => {
                end_line(&mut out);
                out.push_str("- ");
            }
            Event::End(Tag::Item) | Event::End(Tag::TableRow) | Event::End(Tag::TableHead) => {
                end_line(&mut out)
            }
            Event::End(Tag::TableCell) => out.push(' '),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(..))
            | Event::End(Tag::CodeBlock(_))
            | Event::End(Tag::List(_))
            | Event::End(Tag::BlockQuote)
            | Event::Rule => {
                end_line(&mut out);
                out.push('\n');
            }
            _ => {}
        }
    }
    out
}

fn end_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Strip markup, trim lines, wrap long ones. Header lines stay as written.
pub fn markdown_to_plain_text(md: &str) -> String {
    let stripped = strip_markdown(md);
    let mut lines: Vec<String> = Vec::new();
    for line in stripped.lines() {
        let line = line.trim();
        if line.is_empty() {
            lines.push(String::new());
        } else if line.starts_with("Summary for:") || line.starts_with("Generated:") {
            lines.push(line.to_string());
        } else {
            lines.extend(wrap_text(line, WRAP_WIDTH));
        }
    }
    lines.join("\n")
}

/// Greedy word wrap; a single word longer than `width` gets its own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
