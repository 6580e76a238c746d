//! Lint-changelog-yaml command handler.

use crate::changelog::{lint_changelog_yaml, LintViolation};
use crate::pipeline::{exit_codes, write_output, OutputTarget};
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// How lint results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LintOutput {
    /// `path:line:column: message`, one per line
    #[default]
    Text,
    /// JSON array of violations
    Json,
}

fn format_violations(violations: &[LintViolation], output: LintOutput) -> Result<String> {
    match output {
        LintOutput::Text => Ok(violations
            .iter()
            .map(|violation| format!("{violation}\n"))
            .collect()),
        LintOutput::Json => {
            let mut json = serde_json::to_string_pretty(violations)
                .context("failed to serialize lint results")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Run the lint command, returning the desired exit code.
#[allow(clippy::needless_pass_by_value)]
pub fn run_lint_changelog_yaml(paths: Vec<PathBuf>, output: LintOutput) -> Result<i32> {
    let violations: Vec<LintViolation> = paths
        .iter()
        .flat_map(|path| lint_changelog_yaml(path))
        .collect();

    if !violations.is_empty() || output == LintOutput::Json {
        let text = format_violations(&violations, output)?;
        write_output(&text, &OutputTarget::Stdout, true)?;
    }

    Ok(if violations.is_empty() {
        exit_codes::SUCCESS
    } else {
        exit_codes::LINT_VIOLATIONS
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_text() {
        let violations = vec![LintViolation {
            path: PathBuf::from("changelogs/changelog.yaml"),
            line: 0,
            column: 0,
            message: "bad".into(),
        }];
        assert_eq!(
            format_violations(&violations, LintOutput::Text).unwrap(),
            "changelogs/changelog.yaml:0:0: bad\n"
        );
        assert_eq!(format_violations(&[], LintOutput::Json).unwrap(), "[]\n");
    }

    #[test]
    fn test_exit_code_for_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changelog.yaml");
        std::fs::write(&path, "releases: [not, a, mapping]\n").unwrap();
        let code = run_lint_changelog_yaml(vec![path], LintOutput::Text).unwrap();
        assert_eq!(code, exit_codes::LINT_VIOLATIONS);
    }
}
