//! Build-changelog command handler.
//!
//! Implements the `build-changelog` subcommand: collect the changelogs of
//! every release of an Ansible major version and write the combined
//! changelog and porting guide.

use crate::aggregate::{get_changelog, ChangelogInputs, MissingChangelogReport};
use crate::config::AppConfig;
use crate::pipeline::{open_source, PipelineError};
use crate::render::ReleaseNotes;
use crate::version::PypiVersion;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Inputs of the `build-changelog` command.
#[derive(Debug, Clone)]
pub struct BuildChangelogConfig {
    /// Ansible release to build the notes for
    pub ansible_version: String,
    /// Build data directory with `.deps` files and `changelog.yaml`
    pub data_dir: PathBuf,
    /// Where rendered files go; defaults to `data_dir`
    pub dest_data_dir: Option<PathBuf>,
    pub app: AppConfig,
    pub quiet: bool,
}

/// Run the build-changelog command and return the missing changelog report.
#[allow(clippy::needless_pass_by_value)]
pub fn run_build_changelog(config: BuildChangelogConfig) -> Result<MissingChangelogReport> {
    let version = PypiVersion::parse(&config.ansible_version)
        .with_context(|| format!("invalid Ansible version {}", config.ansible_version))?;

    let inputs = ChangelogInputs::from_deps_dir(version, &config.data_dir).map_err(|e| {
        PipelineError::LoadFailed {
            path: config.data_dir.display().to_string(),
            source: e.into(),
        }
    })?;
    if !config.quiet {
        tracing::info!(
            "Loaded {} dependency manifests from {}",
            inputs.manifests.len(),
            config.data_dir.display()
        );
    }

    let source = open_source(&config.app)?;
    let changelog = get_changelog(inputs, source.as_ref(), config.app.network.thread_max)
        .map_err(|e| PipelineError::CollectFailed { source: e.into() })?;

    let notes = ReleaseNotes::build(
        &changelog,
        &config.app.build.changelog_formats,
        &config.app.build.build_data_url,
    )
    .map_err(|e| PipelineError::RenderFailed { source: e.into() })?;

    let dest = config.dest_data_dir.as_ref().unwrap_or(&config.data_dir);
    let write_failed = |e: crate::error::AntsibullError| PipelineError::WriteFailed {
        path: dest.display().to_string(),
        source: e.into(),
    };
    notes.write_changelog_to(dest).map_err(write_failed)?;
    notes.write_porting_guide_to(dest).map_err(write_failed)?;

    Ok(changelog.missing_changelogs())
}
