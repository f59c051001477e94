// src/summarize/chat.rs
//! OpenAI-compatible chat-completions client (Mistral, OpenAI, local gateways).
//! One user message per call, no streaming, no retries.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{focus_prompt, summary_prompt, Summarizer};
use crate::config::Config;

pub struct ChatCompletionsSummarizer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsSummarizer {
    /// `timeout: None` leaves the transport default in place.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "nub/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().context("building llm http client")?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.llm_api_url.clone(),
            cfg.resolved_api_key()?,
            cfg.llm_api_model.clone(),
            cfg.llm_timeout(),
        )
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            stream: bool,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        let body = resp.text().await.context("reading LLM response")?;
        if !status.is_success() {
            bail!("LLM API error {}: {}", status.as_u16(), body.trim());
        }

        let parsed: Resp =
            serde_json::from_str(&body).context("parsing LLM response JSON")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("no response from LLM"))?;
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for ChatCompletionsSummarizer {
    async fn summarize(&self, text: &str, source: &str, prompt: &str) -> Result<String> {
        self.complete(&summary_prompt(prompt, source, text)).await
    }

    async fn extract_focused(&self, topics: &str, body: &str) -> Result<String> {
        if topics.trim().is_empty() {
            return Ok(String::new());
        }
        self.complete(&focus_prompt(topics, body)).await
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}
