// src/view.rs
//! Builds the `show` output from persisted documents.

use crate::render::{markdown_to_html, markdown_to_plain_text};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────────";

/// Plain-text view for a pager. The focus block only appears when topics are set.
pub fn plain_view(summaries: &[String], focus_docs: &[String], focus_topics: &str) -> String {
    let mut out = String::new();

    if !focus_topics.trim().is_empty() {
        out.push_str(HEAVY_RULE);
        out.push('\n');
        out.push_str(&format!("  FOCUS: {}\n", focus_topics.trim()));
        out.push_str(HEAVY_RULE);
        out.push_str("\n\n");
        for doc in focus_docs {
            out.push_str(&markdown_to_plain_text(doc));
            out.push_str("\n\n");
        }
        out.push_str(LIGHT_RULE);
        out.push_str("\n\n");
    }

    for doc in summaries {
        out.push_str(&markdown_to_plain_text(doc));
        out.push_str("\n\n");
        out.push_str(LIGHT_RULE);
        out.push_str("\n\n");
    }
    out
}

/// Standalone HTML page with a focus section and one block per summary.
pub fn html_view(summaries: &[String], focus_docs: &[String], focus_topics: &str) -> String {
    let mut body = String::new();

    if !focus_topics.trim().is_empty() {
        body.push_str("<section class=\"focus\">\n<h2>Focus: ");
        body.push_str(&html_escape::encode_text(focus_topics.trim()));
        body.push_str("</h2>\n");
        for doc in focus_docs {
            body.push_str(&markdown_to_html(doc));
        }
        body.push_str("</section>\n");
    }

    for doc in summaries {
        body.push_str("<article class=\"summary\">\n");
        body.push_str(&markdown_to_html(doc));
        body.push_str("</article>\n");
    }

    format!("{HTML_HEAD}{body}{HTML_TAIL}")
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>nub</title>
<style>
body { font-family: Verdana, Geneva, sans-serif; font-size: 10pt; background: #f6f6ef; margin: 0; padding: 8px; }
main { max-width: 1200px; margin: 0 auto; }
header { background: #dc94ba; padding: 2px 4px; margin-bottom: 10px; font-weight: bold; }
.summary { background: #fff; border: 1px solid #e0e0e0; padding: 8px; margin-bottom: 8px; }
.focus { background: #fce4f0; border: 1px solid #dc94ba; padding: 10px; margin-bottom: 10px; }
h1, h2, h3 { font-size: 11pt; margin: 8px 0 4px 0; }
p, li { line-height: 1.4; }
pre { background: #f5f5f5; border: 1px solid #ddd; padding: 8px; overflow-x: auto; }
hr { border: none; border-top: 1px solid #ccc; }
</style>
</head>
<body>
<main>
<header>nub</header>
"#;

const HTML_TAIL: &str = "</main>\n</body>\n</html>\n";

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<String> {
        vec!["# Summary for: https://a.example\n\nGenerated: now\n\n---\n\n- item a".to_string()]
    }

    #[test]
    fn plain_view_without_focus_has_no_banner() {
        let out = plain_view(&docs(), &["- ignored".to_string()], "");
        assert!(!out.contains("FOCUS:"));
        assert!(!out.contains("ignored"));
        assert!(out.contains("Summary for: https://a.example"));
        assert!(out.contains(LIGHT_RULE));
    }

    #[test]
    fn plain_view_with_focus_lists_focus_first() {
        let out = plain_view(&docs(), &["- rust thing".to_string()], "rust");
        let focus_at = out.find("FOCUS: rust").unwrap();
        let item_at = out.find("- rust thing").unwrap();
        let summary_at = out.find("Summary for:").unwrap();
        assert!(focus_at < item_at && item_at < summary_at);
    }

    #[test]
    fn html_view_escapes_topics_and_wraps_summaries() {
        let out = html_view(&docs(), &[], "<script>");
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("Focus: &lt;script&gt;"));
        assert!(out.contains("<article class=\"summary\">"));
        assert!(out.contains("<li>item a</li>"));
        assert!(out.trim_end().ends_with("</html>"));
    }
}
