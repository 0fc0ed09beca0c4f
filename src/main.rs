mod analysis;
mod config;
mod filter;
mod pr;
mod provider;
mod report;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pr::{GitHubClient, PrRef};

/// Semantic Lint — reviews the diffs of a GitHub Pull Request against a rules
/// document with an LLM and posts the findings as a PR comment.
///
/// Exits non-zero when any finding has an error-severity type.
#[derive(Parser, Debug)]
#[command(name = "semantic-lint", version, about)]
struct Cli {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42).
    /// Overrides --repository and --pr-number.
    pr_url: Option<String>,

    /// Token used to read the PR and post the comment
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Credential for the AI provider, substituted for {{AI_API_KEY}}
    #[arg(long, env = "INPUT_AI-API-KEY", hide_env_values = true)]
    ai_api_key: Option<String>,

    /// Configuration document (.json or .toml)
    #[arg(
        long,
        env = "INPUT_CONFIG-PATH",
        default_value = ".github/semantic-lint.config.json"
    )]
    config_path: PathBuf,

    /// Rules document sent to the model with every diff
    #[arg(
        long,
        env = "INPUT_RULES-PATH",
        default_value = ".github/SemanticLintingRules.md"
    )]
    rules_path: PathBuf,

    /// Pull request number. Falls back to the workflow event payload.
    #[arg(long, env = "INPUT_PR-NUMBER")]
    pr_number: Option<String>,

    /// Workflow event payload holding pull_request.number
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = pr::github::DEFAULT_API_URL)]
    api_url: String,

    /// Review a local unified diff instead of fetching the PR's files
    #[arg(long)]
    diff: Option<PathBuf>,

    /// Print the report instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Also write the markdown report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Where the changed files come from and where the report goes.
enum Target {
    PullRequest { pr: PrRef, client: GitHubClient },
    LocalDiff(PathBuf),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => {
            info!("blocking issues found");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "semantic lint failed");
            ExitCode::FAILURE
        }
    }
}

/// Run the whole pipeline. Returns whether blocking issues were found.
async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let ai_api_key = cli
        .ai_api_key
        .clone()
        .filter(|key| !key.is_empty())
        .ok_or("AI API key is not set (INPUT_AI-API-KEY or --ai-api-key)")?;

    info!(path = %cli.config_path.display(), "loading configuration");
    let config = config::Config::load_from(&cli.config_path)?;
    info!(path = %cli.rules_path.display(), "loading rules");
    let rules = config::load_rules(&cli.rules_path)?;

    let provider = provider::select(&config.ai)?;
    info!(provider = provider.name(), "config and rules loaded");

    let target = resolve_target(&cli)?;

    let changed_files = match &target {
        Target::PullRequest { pr, client } => {
            info!(pr = %pr, "fetching changed files");
            client.list_changed_files(pr).await?
        }
        Target::LocalDiff(path) => {
            info!(path = %path.display(), "reading local diff");
            let raw = std::fs::read_to_string(path)?;
            pr::diff::split_diff(&raw)?
        }
    };
    info!(files = changed_files.len(), "found raw changed files");

    let files_to_analyze = filter::filter_files(
        changed_files,
        &config.included_files,
        &config.excluded_files,
    )?;
    info!(files = files_to_analyze.len(), "found files to analyze");

    let results = analysis::analyze_all(
        &files_to_analyze,
        &config,
        &rules,
        &ai_api_key,
        provider.as_ref(),
    )
    .await;

    let built_report = report::build_report(&results, &config.severity);
    debug!(
        errors = built_report.error_count,
        warnings = built_report.warning_count,
        "report built"
    );

    if let Some(path) = cli.output.as_deref() {
        report::write_markdown_report(&built_report, path)?;
    }

    match &target {
        Target::PullRequest { pr, client } if !cli.dry_run => {
            info!(pr = %pr, "posting results");
            client.post_comment(pr, &built_report.body).await?;
        }
        _ => report::print_terminal_report(&built_report),
    }

    Ok(built_report.has_blocking_issues)
}

fn resolve_target(cli: &Cli) -> Result<Target, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.diff {
        if !cli.dry_run {
            warn!("--diff has no pull request to comment on, printing the report instead");
        }
        return Ok(Target::LocalDiff(path.clone()));
    }

    let github_token = cli
        .github_token
        .clone()
        .filter(|token| !token.is_empty())
        .ok_or("GitHub token is not set (INPUT_GITHUB-TOKEN or --github-token)")?;

    let pr = match cli.pr_url.as_deref() {
        Some(url) => pr::parse_pr_url(url)?,
        None => {
            let slug = cli
                .repository
                .as_deref()
                .ok_or("repository is not set (GITHUB_REPOSITORY or --repository)")?;
            let (owner, repo) = pr::parse_repo_slug(slug)?;
            let pr_number =
                pr::resolve_pr_number(cli.pr_number.as_deref(), cli.event_path.as_deref())?;
            PrRef {
                owner,
                repo,
                pr_number,
            }
        }
    };
    debug!(owner = %pr.owner, repo = %pr.repo, pr = pr.pr_number, "resolved pull request");

    Ok(Target::PullRequest {
        pr,
        client: GitHubClient::new(&cli.api_url, &github_token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn config_json(endpoint: &str) -> String {
        serde_json::json!({
            "includedFiles": ["**/*.go"],
            "excludedFiles": ["**/*_test.go"],
            "ai": {
                "provider": "openai",
                "promptTemplate": "Rules:\n{rules}\nCode:\n{code}",
                "openai": {"apiEndpoint": endpoint, "model": "gpt-4o"}
            },
            "severity": {"error": ["bug"], "warning": ["style"]}
        })
        .to_string()
    }

    fn cli(dir: &std::path::Path, api_url: &str, endpoint: &str) -> Cli {
        Cli {
            pr_url: None,
            github_token: Some("gh-token".to_string()),
            ai_api_key: Some("sk-test".to_string()),
            config_path: write_file(dir, "config.json", &config_json(endpoint)),
            rules_path: write_file(dir, "rules.md", "R1"),
            pr_number: Some("5".to_string()),
            event_path: None,
            repository: Some("octo/app".to_string()),
            api_url: api_url.to_string(),
            diff: None,
            dry_run: false,
            output: None,
        }
    }

    fn chat_reply(answer: &str) -> String {
        serde_json::json!({"choices":[{"message":{"content": answer}}]}).to_string()
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "semantic-lint",
            "https://github.com/org/repo/pull/9",
            "--dry-run",
            "--config-path",
            "lint.toml",
        ])
        .unwrap();
        assert_eq!(cli.pr_url.as_deref(), Some("https://github.com/org/repo/pull/9"));
        assert!(cli.dry_run);
        assert_eq!(cli.config_path, PathBuf::from("lint.toml"));
    }

    #[test]
    fn test_missing_github_token_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = cli(dir.path(), "http://unused", "http://unused");
        cli.github_token = None;
        assert!(resolve_target(&cli).is_err());
    }

    #[test]
    fn test_pr_url_overrides_repository() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = cli(dir.path(), "http://unused", "http://unused");
        cli.pr_url = Some("https://github.com/other/repo/pull/77".to_string());
        match resolve_target(&cli).unwrap() {
            Target::PullRequest { pr, .. } => {
                assert_eq!(pr.owner, "other");
                assert_eq!(pr.pr_number, 77);
            }
            Target::LocalDiff(_) => panic!("expected pull request target"),
        }
    }

    #[tokio::test]
    async fn test_run_skips_failed_file_and_blocks_on_error() {
        let mut github = mockito::Server::new_async().await;
        let mut llm = mockito::Server::new_async().await;

        github
            .mock("GET", "/repos/octo/app/pulls/5/files")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                serde_json::json!([
                    {"filename": "broken.go", "patch": "@@ -1 +1 @@\n+BROKEN"},
                    {"filename": "main.go", "patch": "@@ -1 +1 @@\n+x := nil"},
                    {"filename": "main_test.go", "patch": "@@ -1 +1 @@\n+t"},
                    {"filename": "README.md", "patch": "@@ -1 +1 @@\n+doc"}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        llm.mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("BROKEN".to_string()))
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        llm.mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::Regex("x := nil".to_string()))
            .with_status(200)
            .with_body(chat_reply(
                "```json\n{\"issues\":[{\"type\":\"bug\",\"message\":\"nil assignment\"}]}\n```",
            ))
            .create_async()
            .await;
        let comment = github
            .mock("POST", "/repos/octo/app/issues/5/comments")
            .match_body(mockito::Matcher::Regex("### main.go".to_string()))
            .with_status(201)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut cli = cli(
            dir.path(),
            &github.url(),
            &format!("{}/v1/chat/completions", llm.url()),
        );
        let report_path = dir.path().join("report.md");
        cli.output = Some(report_path.clone());

        let blocking = run(cli).await.unwrap();

        comment.assert_async().await;
        assert!(blocking);
        let body = std::fs::read_to_string(report_path).unwrap();
        assert!(body.contains("### main.go"));
        assert!(body.contains("🔴 **bug**: nil assignment"));
        assert!(!body.contains("broken.go"));
        assert!(!body.contains("main_test.go"));
    }

    #[tokio::test]
    async fn test_run_local_diff_without_issues() {
        let mut llm = mockito::Server::new_async().await;
        llm.mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(chat_reply("{\"issues\":[]}"))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let diff = write_file(
            dir.path(),
            "change.diff",
            "diff --git a/main.go b/main.go\n--- a/main.go\n+++ b/main.go\n@@ -1 +1 @@\n-a\n+b\n",
        );
        let mut cli = cli(
            dir.path(),
            "http://unused",
            &format!("{}/v1/chat/completions", llm.url()),
        );
        cli.github_token = None;
        cli.diff = Some(diff);
        cli.dry_run = true;

        assert!(!run(cli).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_unsupported_provider_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = cli(dir.path(), "http://unused", "http://unused");
        cli.config_path = write_file(
            dir.path(),
            "bad.json",
            r#"{"includedFiles":["*"],"ai":{"provider":"mystery"}}"#,
        );
        assert!(run(cli).await.is_err());
    }

    #[tokio::test]
    async fn test_run_missing_rules_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = cli(dir.path(), "http://unused", "http://unused");
        cli.rules_path = dir.path().join("missing.md");
        assert!(run(cli).await.is_err());
    }
}
