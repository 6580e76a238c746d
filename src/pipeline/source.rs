//! Choosing where historical changelogs come from.

use crate::config::AppConfig;
use crate::fetch::{ChangelogSource, DirectorySource};
use anyhow::Result;

/// Changelog source for a build: a local tree when `build.source_dir` is
/// set, Galaxy and PyPI otherwise.
pub fn open_source(config: &AppConfig) -> Result<Box<dyn ChangelogSource>> {
    if let Some(dir) = &config.build.source_dir {
        tracing::info!("Reading changelogs from {}", dir.display());
        return Ok(Box::new(DirectorySource::new(dir.clone())));
    }
    open_network_source(config)
}

#[cfg(feature = "network")]
fn open_network_source(config: &AppConfig) -> Result<Box<dyn ChangelogSource>> {
    use anyhow::Context;

    let source = crate::fetch::NetworkSource::from_config(&config.network)
        .context("failed to set up Galaxy and PyPI downloads")?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "network"))]
fn open_network_source(_config: &AppConfig) -> Result<Box<dyn ChangelogSource>> {
    anyhow::bail!(
        "No changelog source: set build.source_dir or rebuild with the 'network' feature"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_dir_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::builder()
            .source_dir(Some(dir.path().to_path_buf()))
            .build();
        let source = open_source(&config).unwrap();
        let version = semver::Version::new(1, 0, 0);
        assert!(source
            .collection_changelog("acme.tools", &version)
            .unwrap()
            .is_none());
    }
}
