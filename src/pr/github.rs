use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::{ChangedFile, PrRef};
use super::PrError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;
/// GitHub stops listing PR files after 3000 entries.
const MAX_PAGES: usize = 30;

/// Minimal GitHub REST client for listing PR files and posting a comment.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct PullFile {
    filename: String,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// List the files changed by the PR, following pagination.
    ///
    /// Entries without a patch are dropped.
    #[instrument(skip_all, fields(pr = %pr))]
    pub async fn list_changed_files(&self, pr: &PrRef) -> Result<Vec<ChangedFile>, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, pr.owner, pr.repo, pr.pr_number
        );

        let mut files = Vec::new();
        for page in 1..=MAX_PAGES {
            debug!(page, "fetching changed files page");
            let entries = self
                .http
                .get(&url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .header("User-Agent", "semantic-lint")
                .header("Accept", "application/vnd.github+json")
                .bearer_auth(&self.token)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<PullFile>>()
                .await?;

            let count = entries.len();
            files.extend(entries.into_iter().filter_map(|entry| {
                entry.patch.map(|patch| ChangedFile {
                    filename: entry.filename,
                    patch,
                })
            }));

            if count < PER_PAGE {
                break;
            }
        }

        debug!(files = files.len(), "received changed files");
        Ok(files)
    }

    /// Post `body` as a new conversation comment on the PR.
    #[instrument(skip_all, fields(pr = %pr, body_bytes = body.len()))]
    pub async fn post_comment(&self, pr: &PrRef, body: &str) -> Result<(), PrError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, pr.owner, pr.repo, pr.pr_number
        );

        self.http
            .post(&url)
            .header("User-Agent", "semantic-lint")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .json(&NewComment { body })
            .send()
            .await?
            .error_for_status()?;

        debug!("comment posted");
        Ok(())
    }
}
