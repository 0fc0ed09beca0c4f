pub mod types;

pub use types::{FileAnalysisResult, Report, Severity};

use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::SeverityConfig;
use types::{ClassifiedIssue, FileSection};

pub const REPORT_HEADING: &str = "## Semantic Linting Results";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Aggregate per-file findings into the PR comment and the blocking verdict.
///
/// Files without issues get no subsection. The run is blocking iff any issue
/// type is in the error set.
pub fn build_report(results: &[FileAnalysisResult], severity: &SeverityConfig) -> Report {
    let sections: Vec<FileSection> = results
        .iter()
        .filter(|result| !result.issues.is_empty())
        .map(|result| FileSection {
            filename: result.filename.clone(),
            issues: result
                .issues
                .iter()
                .map(|issue| ClassifiedIssue {
                    severity: severity.classify(&issue.kind),
                    issue: issue.clone(),
                })
                .collect(),
        })
        .collect();

    let error_count = sections
        .iter()
        .flat_map(|section| &section.issues)
        .filter(|classified| classified.severity == Severity::Error)
        .count();
    let warning_count = sections
        .iter()
        .map(|section| section.issues.len())
        .sum::<usize>()
        - error_count;

    Report {
        body: render_markdown(&sections),
        sections,
        has_blocking_issues: error_count > 0,
        error_count,
        warning_count,
    }
}

fn render_markdown(sections: &[FileSection]) -> String {
    let mut md = String::new();
    let _ = write!(md, "{}\n\n", REPORT_HEADING);
    for section in sections {
        let _ = write!(md, "### {}\n\n", section.filename);
        for classified in &section.issues {
            let issue = &classified.issue;
            let _ = writeln!(
                md,
                "{} **{}**: {}",
                classified.severity.glyph(),
                issue.kind,
                issue.message
            );
            if let Some(suggestion) = suggestion_of(classified) {
                let _ = writeln!(md, "> Suggestion: {}", suggestion);
            }
            md.push('\n');
        }
    }
    md
}

fn suggestion_of(classified: &ClassifiedIssue) -> Option<&str> {
    classified
        .issue
        .suggestion
        .as_deref()
        .filter(|s| !s.is_empty())
}

/// Print the report to stdout with colors, for dry runs.
pub fn print_terminal_report(report: &Report) {
    println!();
    println!("{}", "═══ Semantic Linting Results ═══".bold());
    if report.sections.is_empty() {
        println!("  No issues found.");
        println!();
        return;
    }

    for section in &report.sections {
        println!();
        println!("{}", section.filename.bold());
        for classified in &section.issues {
            let label = match classified.severity {
                Severity::Error => classified.issue.kind.red().bold(),
                Severity::Warning => classified.issue.kind.yellow().bold(),
            };
            println!("  {} {}: {}", classified.severity.glyph(), label, classified.issue.message);
            if let Some(suggestion) = suggestion_of(classified) {
                println!("      {} {}", "suggestion:".dimmed(), suggestion);
            }
        }
    }

    println!();
    let summary = format!(
        "═══ {} error(s), {} warning(s) ═══",
        report.error_count, report.warning_count
    );
    if report.has_blocking_issues {
        println!("{}", summary.red().bold());
    } else {
        println!("{}", summary.yellow().bold());
    }
    println!();
}

/// Write the markdown comment body to `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, &report.body)?;
    debug!(bytes = report.body.len(), "report written");
    Ok(())
}
