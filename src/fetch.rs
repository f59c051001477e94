// src/fetch.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::time::Duration;

/// Overall per-attempt timeout for page fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Some sites serve bot-blocking pages to unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Retrieves the raw content behind a source identifier.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<String>;
}

/// HTTP GET with a single attempt; no retries.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &str) -> Result<String> {
        let resp = self
            .http
            .get(source)
            .send()
            .await
            .with_context(|| format!("GET {source}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = resp
            .bytes()
            .await
            .with_context(|| format!("reading body of {source}"))?;
        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

/// How far into the body a `<meta>` charset declaration is looked for.
const META_SNIFF_BYTES: usize = 1024;

/// Decode a page body. Charset precedence: Content-Type header, then a
/// `<meta charset>` / `<meta http-equiv>` declaration near the top, then UTF-8.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            // A meta tag read as ASCII cannot declare UTF-16.
            meta_charset(bytes)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .map(Encoding::output_encoding)
        })
        .unwrap_or(UTF_8);
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "body contained undecodable bytes");
    }
    text.into_owned()
}

fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

fn meta_charset(bytes: &[u8]) -> Option<String> {
    static RE_META: OnceCell<Regex> = OnceCell::new();
    let re_meta = RE_META.get_or_init(|| {
        Regex::new(r#"(?i)<meta\b[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9._:\-]+)"#).unwrap()
    });
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_BYTES)]);
    re_meta
        .captures(&head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_wins_over_meta() {
        let body = b"<meta charset=\"utf-8\"><p>caf\xe9</p>";
        let out = decode_body(body, Some("text/html; charset=ISO-8859-1"));
        assert!(out.contains("café"));
    }

    #[test]
    fn meta_declarations_are_honored_without_header_charset() {
        let html5 = b"<html><head><meta charset=\"iso-8859-1\"></head><p>cr\xe8me</p>";
        assert!(decode_body(html5, Some("text/html")).contains("crème"));

        let legacy = b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"><p>caf\xe9</p>";
        assert!(decode_body(legacy, None).contains("café"));
    }

    #[test]
    fn unknown_or_missing_charset_falls_back_to_utf8() {
        let body = "<p>naïve</p>".as_bytes();
        assert_eq!(decode_body(body, Some("text/html; charset=bogus")), "<p>naïve</p>");
        assert_eq!(decode_body(body, None), "<p>naïve</p>");
    }

    #[test]
    fn charset_parameter_parsing() {
        assert_eq!(header_charset("text/html; Charset=\"utf-8\""), Some("utf-8"));
        assert_eq!(header_charset("text/html"), None);
    }
}
