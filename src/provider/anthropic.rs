use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::openai::ChatMessage;
use super::{http, parse_answer, Provider, ProviderError, Stage};
use crate::config::{EndpointConfig, CREDENTIAL_PLACEHOLDER};
use crate::report::types::AnalysisResult;

pub const NAME: &str = "anthropic";

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// Output cap sent with every request.
pub const MAX_TOKENS: u32 = 4096;

/// Anthropic Messages API backend.
pub struct AnthropicProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    headers: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
    pub fn new(config: &EndpointConfig, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self {
            http: http::client(timeout)?,
            endpoint: config.endpoint_or(DEFAULT_ENDPOINT),
            model: config.model.clone(),
            headers: config.headers_or(&[
                ("x-api-key", CREDENTIAL_PLACEHOLDER),
                ("anthropic-version", API_VERSION),
            ]),
        })
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
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
        let request = MessagesRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
        };

        let response: MessagesResponse =
            http::post_json(&self.http, &self.endpoint, &self.headers, credential, &request).await?;
        let block = response.content.into_iter().next().ok_or_else(|| {
            ProviderError::new(Stage::Decode, "no content found in anthropic response")
        })?;
        let text = block.text.unwrap_or_default();
        debug!(answer_bytes = text.len(), "received anthropic answer");
        parse_answer(&text)
    }
}
