use globset::GlobBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Malformed pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: globset::Error,
}

/// Match a slash-separated path against a glob pattern.
///
/// `*` stays within one path segment, `**` spans directory boundaries and
/// also matches zero directories (`**/*.go` matches `main.go`). A non-match is
/// `Ok(false)`; only a malformed pattern is an error.
pub fn matches(path: &str, pattern: &str) -> Result<bool, PatternError> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })?;
    Ok(glob.compile_matcher().is_match(path))
}

/// True if `path` matches any of `patterns`. Stops at the first malformed one.
pub fn matches_any(path: &str, patterns: &[String]) -> Result<bool, PatternError> {
    for pattern in patterns {
        if matches(path, pattern)? {
            return Ok(true);
        }
    }
    Ok(false)
}
