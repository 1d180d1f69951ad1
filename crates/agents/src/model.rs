use std::env;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat-completions runtime configuration. Absent when no model key is set,
/// in which case the rule-composed policies run instead.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl ModelConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("SCOUT_MODEL_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty())?;

        Some(Self {
            api_key,
            model: env::var("SCOUT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            base_url: env::var("SCOUT_MODEL_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        })
    }
}

#[derive(Clone)]
pub struct ModelClient {
    http: Client,
    config: ModelConfig,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    content: Option<String>,
}

impl ModelClient {
    pub fn new(http: Client, config: ModelConfig) -> Self {
        Self { http, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = CompletionRequest {
            model: &self.config.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: system,
                },
                CompletionMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat completion rejected with status {}",
                response.status()
            ));
        }

        let payload: CompletionResponse = response
            .json()
            .await
            .context("chat completion payload could not be parsed")?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("chat completion carried no content"))
    }
}
