//! Generate-changelog command handler.
//!
//! Renders the release notes of a single `changelog.yaml`.

use crate::changelog::{ChangelogConfig, ChangelogData, ChangesDocument};
use crate::pipeline::{write_output, OutputTarget};
use crate::render::{generate_standalone, DocumentFormat};
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// What a `changelog.yaml` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChangelogKind {
    /// A collection (semantic versions)
    Collection,
    /// ansible-core (PEP 440 versions)
    Core,
    /// The Ansible package (PEP 440 versions)
    Ansible,
}

/// Inputs of the `generate-changelog` command.
#[derive(Debug, Clone)]
pub struct GenerateChangelogConfig {
    pub changelog: PathBuf,
    pub kind: ChangelogKind,
    /// Collection name, used as title and plugin prefix
    pub collection: Option<String>,
    pub format: DocumentFormat,
    pub output_file: Option<PathBuf>,
    pub quiet: bool,
}

fn load(config: &GenerateChangelogConfig) -> Result<(ChangelogData, String)> {
    let bytes = std::fs::read(&config.changelog)
        .with_context(|| format!("Failed to read {}", config.changelog.display()))?;
    let loaded = match config.kind {
        ChangelogKind::Collection => {
            let name = config
                .collection
                .as_deref()
                .context("--collection is required for collection changelogs")?;
            (ChangelogData::collection(name, &bytes)?, format!("{name}."))
        }
        ChangelogKind::Core => (
            ChangelogData::ansible_core(&bytes)?,
            "ansible.builtin.".to_string(),
        ),
        ChangelogKind::Ansible => {
            let changelog_config = ChangelogConfig::ansible();
            let document = ChangesDocument::from_yaml(&bytes, &changelog_config)?;
            (ChangelogData::new(changelog_config, document), String::new())
        }
    };
    Ok(loaded)
}

/// Run the generate-changelog command
#[allow(clippy::needless_pass_by_value)]
pub fn run_generate_changelog(config: GenerateChangelogConfig) -> Result<()> {
    let (data, prefix) = load(&config)
        .with_context(|| format!("Failed to load {}", config.changelog.display()))?;
    let text = generate_standalone(&data, &prefix, config.format)?;
    write_output(
        &text,
        &OutputTarget::from_option(config.output_file),
        config.quiet,
    )
}
