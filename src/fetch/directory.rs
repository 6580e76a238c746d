//! Changelogs read from a local directory tree.
//!
//! Layout:
//!
//! ```text
//! <root>/collections/<namespace.name>/<version>/changelogs/changelog.yaml
//! <root>/ansible-core/<version>/changelogs/changelog.yaml
//! <root>/ansible-core/<version>/docs/docsite/rst/porting_guides/porting_guide_core_<x.y>.rst
//! ```
//!
//! A `changelog.yaml` directly in the version directory is accepted too.

use super::{porting_guide_path, ChangelogSource};
use crate::error::{AntsibullError, Result};
use crate::version::PypiVersion;
use std::path::{Path, PathBuf};

/// Offline [`ChangelogSource`] over an unpacked tree of releases.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

fn read_first(candidates: &[PathBuf]) -> Result<Option<Vec<u8>>> {
    for path in candidates {
        if path.is_file() {
            let bytes = std::fs::read(path).map_err(|e| AntsibullError::io(path, e))?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

fn changelog_candidates(dir: &Path) -> [PathBuf; 2] {
    [
        dir.join("changelogs").join("changelog.yaml"),
        dir.join("changelog.yaml"),
    ]
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str, version: &semver::Version) -> PathBuf {
        self.root
            .join("collections")
            .join(collection)
            .join(version.to_string())
    }

    fn core_dir(&self, version: &PypiVersion) -> PathBuf {
        self.root.join("ansible-core").join(version.to_string())
    }
}

impl ChangelogSource for DirectorySource {
    fn collection_changelog(
        &self,
        collection: &str,
        version: &semver::Version,
    ) -> Result<Option<Vec<u8>>> {
        read_first(&changelog_candidates(&self.collection_dir(collection, version)))
    }

    fn core_changelog(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        read_first(&changelog_candidates(&self.core_dir(version)))
    }

    fn core_porting_guide(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        read_first(&[self.core_dir(version).join(porting_guide_path(version))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let coll = tmp
            .path()
            .join("collections/acme.tools/1.0.0/changelogs");
        std::fs::create_dir_all(&coll).unwrap();
        std::fs::write(coll.join("changelog.yaml"), "releases: {}\n").unwrap();

        let core = tmp.path().join("ansible-core/2.16.0");
        std::fs::create_dir_all(&core).unwrap();
        std::fs::write(core.join("changelog.yaml"), "releases: {}\n").unwrap();

        let source = DirectorySource::new(tmp.path());
        let v100 = semver::Version::new(1, 0, 0);
        assert!(source.collection_changelog("acme.tools", &v100).unwrap().is_some());
        assert!(source
            .collection_changelog("acme.tools", &semver::Version::new(2, 0, 0))
            .unwrap()
            .is_none());

        let core_version = PypiVersion::parse("2.16.0").unwrap();
        assert!(source.core_changelog(&core_version).unwrap().is_some());
        assert!(source.core_porting_guide(&core_version).unwrap().is_none());
    }
}
