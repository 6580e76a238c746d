//! Add-release command handler.
//!
//! Records a new Ansible release in the build data's `changelog.yaml`.

use crate::changelog::ChangelogData;
use crate::version::PypiVersion;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Inputs of the `add-release` command.
#[derive(Debug, Clone)]
pub struct AddReleaseConfig {
    pub data_dir: PathBuf,
    pub version: String,
    /// Release date; today when absent
    pub date: Option<NaiveDate>,
    pub release_summary: String,
}

/// Run the add-release command
#[allow(clippy::needless_pass_by_value)]
pub fn run_add_release(config: AddReleaseConfig) -> Result<()> {
    let version = PypiVersion::parse(&config.version)
        .with_context(|| format!("invalid Ansible version {}", config.version))?;
    let date = config
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut data = ChangelogData::ansible(Some(&config.data_dir))
        .with_context(|| format!("Failed to load changelog from {}", config.data_dir.display()))?;
    data.add_ansible_release(&version.to_string(), date, &config.release_summary)?;

    let path = config.data_dir.join("changelog.yaml");
    data.document().save(&path)?;
    tracing::info!("Added Ansible {version} to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_release_creates_changelog() {
        let dir = tempfile::tempdir().unwrap();
        run_add_release(AddReleaseConfig {
            data_dir: dir.path().to_path_buf(),
            version: "9.1.0".into(),
            date: NaiveDate::from_ymd_opt(2023, 12, 5),
            release_summary: "Release summary for Ansible 9.1.0.".into(),
        })
        .unwrap();

        let data = ChangelogData::ansible(Some(dir.path())).unwrap();
        let release = data.document().release("9.1.0").unwrap();
        assert_eq!(release.release_date.as_deref(), Some("2023-12-05"));
        let entries = data.collect(true, None, None).unwrap();
        assert!(!entries[0].has_no_changes(Some(&["release_summary"])));
    }
}
