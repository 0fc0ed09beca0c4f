pub mod anthropic;
pub mod gemini;
pub mod http;
pub mod openai;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::{AiConfig, ConfigError};
use crate::report::types::AnalysisResult;

/// Step of a provider call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RequestBuild,
    Network,
    HttpStatus,
    Decode,
    Parse,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::RequestBuild => write!(f, "request-build"),
            Stage::Network => write!(f, "network"),
            Stage::HttpStatus => write!(f, "http-status"),
            Stage::Decode => write!(f, "decode"),
            Stage::Parse => write!(f, "parse"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{stage} error: {detail}")]
pub struct ProviderError {
    pub stage: Stage,
    pub detail: String,
}

impl ProviderError {
    pub fn new(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
        }
    }
}

/// A backend LLM service that reviews one patch.
///
/// Every implementation speaks its own wire format but returns the same
/// normalized [`AnalysisResult`]. One outbound request per call, no retries.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Configuration tag this provider is selected by (e.g., "openai")
    fn name(&self) -> &str;

    async fn analyze(
        &self,
        patch: &str,
        prompt: &str,
        credential: &str,
    ) -> Result<AnalysisResult, ProviderError>;
}

/// Build the provider named by `ai.provider`.
pub fn select(ai: &AiConfig) -> Result<Box<dyn Provider>, ConfigError> {
    let timeout = ai.request_timeout_secs.map(Duration::from_secs);
    let provider: Box<dyn Provider> = match ai.provider.as_str() {
        gemini::NAME => Box::new(gemini::GeminiProvider::new(&ai.gemini, timeout)?),
        openai::NAME => Box::new(openai::OpenAiProvider::new(&ai.openai, timeout)?),
        anthropic::NAME => Box::new(anthropic::AnthropicProvider::new(&ai.anthropic, timeout)?),
        other => return Err(ConfigError::UnsupportedProvider(other.to_string())),
    };
    Ok(provider)
}

/// Turn the model's answer text into an [`AnalysisResult`].
///
/// Strips one leading "```json" and one trailing "```" literally, trims, then
/// parses the remainder as JSON.
pub fn parse_answer(text: &str) -> Result<AnalysisResult, ProviderError> {
    let body = text.strip_prefix("```json").unwrap_or(text);
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = body.trim();
    serde_json::from_str(body).map_err(|e| {
        ProviderError::new(
            Stage::Parse,
            format!("answer is not a valid analysis result: {}", e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::report::types::Issue;
    use std::collections::BTreeMap;

    const ANSWER: &str = "```json\n{\"issues\":[{\"type\":\"naming\",\"message\":\"bad name\",\"suggestion\":\"rename to camelCase\"}]}\n```";

    fn endpoint(url: String) -> EndpointConfig {
        EndpointConfig {
            api_endpoint: Some(url),
            model: "model-x".to_string(),
            headers: Some(BTreeMap::from([(
                "x-key".to_string(),
                "{{AI_API_KEY}}".to_string(),
            )])),
        }
    }

    #[test]
    fn test_parse_fenced_answer() {
        let result = parse_answer("```json\n{\"issues\":[]}\n```").unwrap();
        assert_eq!(result, AnalysisResult { issues: vec![] });
    }

    #[test]
    fn test_parse_bare_answer() {
        let result =
            parse_answer("  {\"issues\":[{\"type\":\"bug\",\"message\":\"npe\"}]}\n").unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, "bug");
    }

    #[test]
    fn test_parse_strips_only_one_fence() {
        // the closing fence is removed once, leaving a dangling fence behind
        let err = parse_answer("```json\n{\"issues\":[]}\n``````").unwrap_err();
        assert_eq!(err.stage, Stage::Parse);
    }

    #[test]
    fn test_parse_issue_missing_message() {
        let result = parse_answer(r#"{"issues":[{"type":"bug"}]}"#).unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, "bug");
        assert_eq!(result.issues[0].message, "");
    }

    #[test]
    fn test_parse_null_fields() {
        let result = parse_answer(r#"{"issues":null}"#).unwrap();
        assert!(result.issues.is_empty());

        let result =
            parse_answer(r#"{"issues":[{"type":null,"message":"m","suggestion":null}]}"#).unwrap();
        assert_eq!(result.issues[0].kind, "");
        assert!(result.issues[0].suggestion.is_none());
    }

    #[test]
    fn test_parse_capitalized_keys() {
        let result = parse_answer(
            r#"{"Issues":[{"Type":"bug","Message":"m","Suggestion":"fix it"}]}"#,
        )
        .unwrap();
        assert_eq!(
            result.issues,
            vec![Issue {
                kind: "bug".to_string(),
                message: "m".to_string(),
                suggestion: Some("fix it".to_string()),
            }]
        );
    }

    #[test]
    fn test_parse_prose_is_error() {
        let err = parse_answer("I found no problems in this diff.").unwrap_err();
        assert_eq!(err.stage, Stage::Parse);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::RequestBuild.to_string(), "request-build");
        assert_eq!(Stage::HttpStatus.to_string(), "http-status");
        let err = ProviderError::new(Stage::Decode, "no content found");
        assert_eq!(err.to_string(), "decode error: no content found");
    }

    #[test]
    fn test_select_known_providers() {
        for name in ["gemini", "openai", "anthropic"] {
            let ai = AiConfig {
                provider: name.to_string(),
                ..AiConfig::default()
            };
            assert_eq!(select(&ai).unwrap().name(), name);
        }
    }

    #[test]
    fn test_select_unknown_provider() {
        let ai = AiConfig {
            provider: "llama".to_string(),
            ..AiConfig::default()
        };
        assert!(matches!(
            select(&ai),
            Err(ConfigError::UnsupportedProvider(tag)) if tag == "llama"
        ));
    }

    #[tokio::test]
    async fn test_every_provider_yields_same_result() {
        let mut server = mockito::Server::new_async().await;
        let answer = serde_json::Value::String(ANSWER.to_string());
        server
            .mock("POST", "/gemini")
            .with_status(200)
            .with_body(
                serde_json::json!({"candidates":[{"content":{"parts":[{"text": answer}]}}]})
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/openai")
            .with_status(200)
            .with_body(
                serde_json::json!({"choices":[{"message":{"role":"assistant","content": answer}}]})
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/anthropic")
            .with_status(200)
            .with_body(
                serde_json::json!({"content":[{"type":"text","text": answer}]}).to_string(),
            )
            .create_async()
            .await;

        let ai = AiConfig {
            gemini: endpoint(format!("{}/gemini", server.url())),
            openai: endpoint(format!("{}/openai", server.url())),
            anthropic: endpoint(format!("{}/anthropic", server.url())),
            ..AiConfig::default()
        };

        let expected = AnalysisResult {
            issues: vec![Issue {
                kind: "naming".to_string(),
                message: "bad name".to_string(),
                suggestion: Some("rename to camelCase".to_string()),
            }],
        };
        for name in ["gemini", "openai", "anthropic"] {
            let ai = AiConfig {
                provider: name.to_string(),
                ..ai.clone()
            };
            let provider = select(&ai).unwrap();
            let result = provider.analyze("P1", "prompt", "secret").await.unwrap();
            assert_eq!(result, expected, "provider {}", name);
        }
    }
}
