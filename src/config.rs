use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::report::types::Severity;

/// Placeholder replaced by the AI credential in endpoints and header values.
pub const CREDENTIAL_PLACEHOLDER: &str = "{{AI_API_KEY}}";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Failed to parse JSON config file: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Top-level configuration, usually `.github/semantic-lint.config.json`.
///
/// Loaded once at startup and passed by reference afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Glob patterns a changed file must match at least one of
    #[serde(default)]
    pub included_files: Vec<String>,

    /// Glob patterns that drop a changed file
    #[serde(default)]
    pub excluded_files: Vec<String>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub severity: SeverityConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    /// Backend tag: "gemini", "openai" or "anthropic"
    #[serde(default)]
    pub provider: String,

    /// Prompt with `{rules}` and `{code}` placeholders
    #[serde(default)]
    pub prompt_template: String,

    /// Per-request timeout for provider calls. No timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub gemini: EndpointConfig,

    #[serde(default)]
    pub openai: EndpointConfig,

    #[serde(default)]
    pub anthropic: EndpointConfig,
}

/// Endpoint, model and header template for one backend.
///
/// Missing endpoint or headers fall back to the backend's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default)]
    pub api_endpoint: Option<String>,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

impl EndpointConfig {
    pub fn endpoint_or(&self, default: &str) -> String {
        self.api_endpoint
            .clone()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn headers_or(&self, default: &[(&str, &str)]) -> BTreeMap<String, String> {
        self.headers.clone().unwrap_or_else(|| {
            default
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
    }
}

/// Issue-type labels bucketed into severity classes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeverityConfig {
    #[serde(default)]
    pub error: Vec<String>,

    #[serde(default)]
    pub warning: Vec<String>,
}

impl SeverityConfig {
    /// Labels outside the error set, including unknown ones, are warnings.
    pub fn classify(&self, issue_type: &str) -> Severity {
        if self.error.iter().any(|label| label == issue_type) {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

impl Config {
    /// Load from a TOML (`.toml`) or JSON (anything else) document.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            toml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };
        Ok(config)
    }
}

/// Read the rules document. The run cannot proceed without one.
pub fn load_rules(path: &Path) -> Result<String, ConfigError> {
    Ok(fs::read_to_string(path)?)
}
