use serde::{Deserialize, Deserializer, Serialize};

/// Severity class an issue falls into, decided by the configured label sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Glyph used in the posted comment.
    pub fn glyph(self) -> &'static str {
        match self {
            Severity::Warning => "⚠️",
            Severity::Error => "🔴",
        }
    }
}

/// Missing or `null` values decode as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single finding returned by the model.
///
/// Decoding is lenient: absent fields are empty and capitalized keys are
/// accepted, since models don't follow the requested shape reliably.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Issue {
    /// Issue-type label, matched against the severity classification
    #[serde(
        rename = "type",
        alias = "Type",
        default,
        deserialize_with = "null_as_default"
    )]
    pub kind: String,
    #[serde(alias = "Message", default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(alias = "Suggestion", default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Normalized output of every provider, whichever backend produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisResult {
    #[serde(alias = "Issues", default, deserialize_with = "null_as_default")]
    pub issues: Vec<Issue>,
}

/// Findings for one analyzed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysisResult {
    pub filename: String,
    pub issues: Vec<Issue>,
}

/// An issue paired with the severity class it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedIssue {
    pub severity: Severity,
    pub issue: Issue,
}

/// Report subsection for a file with at least one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    pub filename: String,
    pub issues: Vec<ClassifiedIssue>,
}

/// Aggregated outcome of a run, ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Markdown comment body
    pub body: String,
    pub sections: Vec<FileSection>,
    /// True when any issue type is in the error set
    pub has_blocking_issues: bool,
    pub error_count: usize,
    pub warning_count: usize,
}
