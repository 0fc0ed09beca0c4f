use super::types::ChangedFile;
use super::PrError;

/// Split a unified diff (e.g. `git diff` output) into per-file patches.
///
/// Each file section starts with `diff --git a/{path} b/{path}`. The patch
/// kept for a file is everything from its first `@@` hunk header onward, the
/// same shape GitHub reports in a PR file's `patch` field. Sections without
/// hunks (binary files, pure renames, mode changes) are skipped.
pub fn split_diff(raw_diff: &str) -> Result<Vec<ChangedFile>, PrError> {
    if raw_diff.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in raw_diff.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            finish(&mut files, &mut current);
            current = Some((parse_header_path(rest)?, Vec::new()));
            continue;
        }

        let Some((_, lines)) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            parse_hunk_header(line)?;
            lines.push(line);
        } else if !lines.is_empty() {
            lines.push(line);
        }
    }

    finish(&mut files, &mut current);
    Ok(files)
}

fn finish(files: &mut Vec<ChangedFile>, current: &mut Option<(String, Vec<&str>)>) {
    if let Some((filename, lines)) = current.take() {
        if !lines.is_empty() {
            files.push(ChangedFile {
                filename,
                patch: lines.join("\n"),
            });
        }
    }
}

fn parse_header_path(rest: &str) -> Result<String, PrError> {
    let mut parts = rest.split_whitespace();
    let a_path = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing a/ path in diff header".to_string()))?;
    let b_path = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing b/ path in diff header".to_string()))?;
    Ok(b_path
        .strip_prefix("b/")
        .or_else(|| a_path.strip_prefix("a/"))
        .unwrap_or(b_path)
        .to_string())
}

fn parse_hunk_header(line: &str) -> Result<(), PrError> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| PrError::DiffParse("Invalid hunk header".to_string()))?;
    let (ranges, _) = header
        .split_once("@@")
        .ok_or_else(|| PrError::DiffParse(format!("Unterminated hunk header: {}", line)))?;
    let mut parts = ranges.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing old range".to_string()))?;
    let new_part = parts
        .next()
        .ok_or_else(|| PrError::DiffParse("Missing new range".to_string()))?;

    parse_range(old_part, '-')?;
    parse_range(new_part, '+')?;
    Ok(())
}

fn parse_range(part: &str, prefix: char) -> Result<(), PrError> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| PrError::DiffParse("Invalid range prefix".to_string()))?;
    let (start_str, count_str) = range.split_once(',').unwrap_or((range, "1"));
    start_str
        .parse::<usize>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range start in {}", part)))?;
    count_str
        .parse::<usize>()
        .map_err(|_| PrError::DiffParse(format!("Invalid range count in {}", part)))?;
    Ok(())
}
