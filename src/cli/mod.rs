//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod build;
mod generate;
mod lint;
mod release;

pub use build::{run_build_changelog, BuildChangelogConfig};
pub use generate::{run_generate_changelog, ChangelogKind, GenerateChangelogConfig};
pub use lint::{run_lint_changelog_yaml, LintOutput};
pub use release::{run_add_release, AddReleaseConfig};
