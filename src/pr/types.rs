/// A file touched by the pull request.
///
/// Files without a patch (binary or oversized) never become a ChangedFile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Path relative to the repository root (e.g., "src/auth/config.rs")
    pub filename: String,
    /// Unified-diff hunks for this file, starting at the first `@@` header
    pub patch: String,
}

/// Identifies one pull request on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl std::fmt::Display for PrRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pr_number)
    }
}
