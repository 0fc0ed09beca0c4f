pub mod diff;
pub mod github;
pub mod types;

pub use github::GitHubClient;
pub use types::{ChangedFile, PrRef};

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid repository slug {0:?}, expected owner/repo")]
    InvalidRepository(String),

    #[error("Failed to parse diff: {0}")]
    DiffParse(String),

    #[error("Pull request number not set and no event payload path given")]
    MissingEventPath,

    #[error("Failed to read event payload: {0}")]
    EventRead(#[from] std::io::Error),

    #[error("Failed to parse event payload: {0}")]
    EventParse(#[from] serde_json::Error),

    #[error("Pull request number not found in event payload")]
    MissingPrNumber,
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PrRef, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PrRef {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

/// Split an `owner/repo` slug such as `GITHUB_REPOSITORY`.
pub fn parse_repo_slug(slug: &str) -> Result<(String, String), PrError> {
    match slug.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(PrError::InvalidRepository(slug.to_string())),
    }
}

/// Resolve the PR number from an explicit value or a workflow event payload.
///
/// An explicit value that doesn't parse as a positive integer falls through to
/// the payload's `pull_request.number`.
pub fn resolve_pr_number(
    explicit: Option<&str>,
    event_path: Option<&Path>,
) -> Result<u64, PrError> {
    if let Some(number) = explicit
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
    {
        return Ok(number);
    }

    let path = event_path.ok_or(PrError::MissingEventPath)?;
    let data = std::fs::read_to_string(path)?;
    pr_number_from_event(&data)
}

fn pr_number_from_event(payload: &str) -> Result<u64, PrError> {
    #[derive(Deserialize)]
    struct PullRequest {
        #[serde(default)]
        number: u64,
    }

    #[derive(Deserialize)]
    struct Event {
        pull_request: Option<PullRequest>,
    }

    let event: Event = serde_json::from_str(payload)?;
    match event.pull_request {
        Some(pr) if pr.number > 0 => Ok(pr.number),
        _ => Err(PrError::MissingPrNumber),
    }
}
