use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{http, parse_answer, Provider, ProviderError, Stage};
use crate::config::EndpointConfig;
use crate::report::types::AnalysisResult;

pub const NAME: &str = "openai";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat completions backend.
pub struct OpenAiProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    headers: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
pub(super) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &EndpointConfig, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self {
            http: http::client(timeout)?,
            endpoint: config.endpoint_or(DEFAULT_ENDPOINT),
            model: config.model.clone(),
            headers: config.headers_or(&[("Authorization", "Bearer {{AI_API_KEY}}")]),
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(skip_all, fields(provider = NAME, model = %self.model))]
    async fn analyze(
        &self,
        _patch: &str,
        prompt: &str,
        credential: &str,
    ) -> Result<AnalysisResult, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response: ChatResponse =
            http::post_json(&self.http, &self.endpoint, &self.headers, credential, &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                ProviderError::new(Stage::Decode, "no choices found in openai response")
            })?;
        let text = choice.message.content.unwrap_or_default();
        debug!(answer_bytes = text.len(), "received openai answer");
        parse_answer(&text)
    }
}
