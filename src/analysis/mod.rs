use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::pr::ChangedFile;
use crate::provider::{Provider, ProviderError};
use crate::report::types::{AnalysisResult, FileAnalysisResult};

const RULES_PLACEHOLDER: &str = "{rules}";
const CODE_PLACEHOLDER: &str = "{code}";

/// Fill the prompt template.
///
/// Only the first `{rules}` and then the first `{code}` are replaced; later
/// occurrences stay as written.
pub fn build_prompt(template: &str, rules: &str, patch: &str) -> String {
    template
        .replacen(RULES_PLACEHOLDER, rules, 1)
        .replacen(CODE_PLACEHOLDER, patch, 1)
}

/// Review one changed file with the selected provider.
pub async fn analyze_changed_file(
    file: &ChangedFile,
    config: &Config,
    rules: &str,
    credential: &str,
    provider: &dyn Provider,
) -> Result<AnalysisResult, ProviderError> {
    let prompt = build_prompt(&config.ai.prompt_template, rules, &file.patch);
    debug!(prompt_bytes = prompt.len(), "built prompt");
    provider.analyze(&file.patch, &prompt, credential).await
}

/// Review every file in order, one request at a time.
///
/// A file whose analysis fails is logged and left out of the results; the
/// remaining files are still reviewed.
pub async fn analyze_all(
    files: &[ChangedFile],
    config: &Config,
    rules: &str,
    credential: &str,
    provider: &dyn Provider,
) -> Vec<FileAnalysisResult> {
    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let span = info_span!("analyze", file = %file.filename, provider = provider.name());
        match analyze_changed_file(file, config, rules, credential, provider)
            .instrument(span)
            .await
        {
            Ok(analysis) => {
                debug!(file = %file.filename, issues = analysis.issues.len(), "file analyzed");
                results.push(FileAnalysisResult {
                    filename: file.filename.clone(),
                    issues: analysis.issues,
                });
            }
            Err(err) => {
                warn!(
                    file = %file.filename,
                    stage = %err.stage,
                    error = %err,
                    "analysis failed, skipping file"
                );
            }
        }
    }
    info!(analyzed = results.len(), skipped = files.len() - results.len(), "analysis complete");
    results
}
