use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::{ProviderError, Stage};
use crate::config::CREDENTIAL_PLACEHOLDER;

/// HTTP client shared by all calls of one provider.
pub fn client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent("semantic-lint");
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Replace every credential placeholder in `template`.
pub fn substitute_credential(template: &str, credential: &str) -> String {
    template.replace(CREDENTIAL_PLACEHOLDER, credential)
}

fn header_map(
    headers: &BTreeMap<String, String>,
    credential: &str,
) -> Result<HeaderMap, ProviderError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ProviderError::new(
                Stage::RequestBuild,
                format!("invalid header name {:?}: {}", name, e),
            )
        })?;
        let value =
            HeaderValue::from_str(&substitute_credential(value, credential)).map_err(|e| {
                ProviderError::new(
                    Stage::RequestBuild,
                    format!("invalid value for header {}: {}", name.as_str(), e),
                )
            })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// POST `body` as JSON and decode the JSON reply into `R`.
///
/// The credential placeholder is substituted in the endpoint and in every
/// header value. Non-2xx replies carry the response body in the error.
pub async fn post_json<B, R>(
    client: &reqwest::Client,
    endpoint: &str,
    headers: &BTreeMap<String, String>,
    credential: &str,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let url = reqwest::Url::parse(&substitute_credential(endpoint, credential)).map_err(|e| {
        ProviderError::new(Stage::RequestBuild, format!("invalid endpoint URL: {}", e))
    })?;
    let payload = serde_json::to_vec(body).map_err(|e| {
        ProviderError::new(
            Stage::RequestBuild,
            format!("failed to encode request body: {}", e),
        )
    })?;

    debug!(
        host = url.host_str().unwrap_or_default(),
        payload_bytes = payload.len(),
        "sending provider request"
    );
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .headers(header_map(headers, credential)?)
        .body(payload)
        .send()
        .await
        .map_err(|e| ProviderError::new(Stage::Network, format!("failed to send request: {}", e)))?;

    let status = response.status();
    let text = response.text().await.map_err(|e| {
        ProviderError::new(Stage::Network, format!("failed to read response body: {}", e))
    })?;

    if !status.is_success() {
        return Err(ProviderError::new(
            Stage::HttpStatus,
            format!("API request failed with status {}: {}", status, text),
        ));
    }

    serde_json::from_str(&text).map_err(|e| {
        ProviderError::new(Stage::Decode, format!("failed to decode response: {}", e))
    })
}
