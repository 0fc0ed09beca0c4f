use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{http, parse_answer, Provider, ProviderError, Stage};
use crate::config::{EndpointConfig, CREDENTIAL_PLACEHOLDER};
use crate::report::types::AnalysisResult;

pub const NAME: &str = "gemini";

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent";
const MODEL_PLACEHOLDER: &str = "{model}";

/// Google Gemini `generateContent` backend.
///
/// The prompt travels as a single text part inside `contents[].parts[]`; the
/// answer is the first candidate's first part.
pub struct GeminiProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    headers: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: &EndpointConfig, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self {
            http: http::client(timeout)?,
            endpoint: config.endpoint_or(DEFAULT_ENDPOINT),
            model: config.model.clone(),
            headers: config.headers_or(&[("x-goog-api-key", CREDENTIAL_PLACEHOLDER)]),
        })
    }
}

fn answer_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let part = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .ok_or_else(|| ProviderError::new(Stage::Decode, "no content found in gemini response"))?;
    part.text
        .ok_or_else(|| ProviderError::new(Stage::Decode, "first gemini part carries no text"))
}

#[async_trait]
impl Provider for GeminiProvider {
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
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };
        let endpoint = self.endpoint.replace(MODEL_PLACEHOLDER, &self.model);

        let response: GenerateResponse =
            http::post_json(&self.http, &endpoint, &self.headers, credential, &request).await?;
        let text = answer_text(response)?;
        debug!(answer_bytes = text.len(), "received gemini answer");
        parse_answer(&text)
    }
}
