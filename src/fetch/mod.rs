//! Sources of historical changelog documents.
//!
//! Collectors never talk to the network or the file system directly; they
//! ask a [`ChangelogSource`] for the `changelog.yaml` of a dependency as
//! released in a given version. `Ok(None)` means the release exists but has
//! no changelog (or could not be found); errors are data gaps the caller
//! absorbs.

mod directory;
mod memory;

#[cfg(feature = "network")]
mod cache;
#[cfg(feature = "network")]
mod galaxy;
#[cfg(feature = "network")]
mod http;
#[cfg(feature = "network")]
mod pypi;
#[cfg(feature = "network")]
pub mod tarball;

pub use directory::DirectorySource;
pub use memory::MemorySource;

#[cfg(feature = "network")]
pub use cache::{ArtifactKey, DownloadCache};
#[cfg(feature = "network")]
pub use galaxy::GalaxySource;
#[cfg(feature = "network")]
pub use http::RetryingClient;
#[cfg(feature = "network")]
pub use pypi::{NetworkSource, PypiCoreSource};

use crate::error::Result;
use crate::version::PypiVersion;

/// Provider of changelog documents and ansible-core porting guides.
///
/// Implementations must be shareable across the download worker pool.
pub trait ChangelogSource: Send + Sync {
    /// Raw `changelog.yaml` of `collection` as released in `version`.
    fn collection_changelog(
        &self,
        collection: &str,
        version: &semver::Version,
    ) -> Result<Option<Vec<u8>>>;

    /// Raw `changelogs/changelog.yaml` of ansible-core `version`.
    fn core_changelog(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>>;

    /// Porting guide (RST) for the major.minor series of ansible-core `version`.
    fn core_porting_guide(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>>;
}

/// Repository path of the porting guide for a core release series.
///
/// The 2.10 series shipped as ansible-base and named its guide accordingly.
#[must_use]
pub fn porting_guide_path(version: &PypiVersion) -> String {
    let (major, minor) = version.major_minor();
    let basename = if major == 2 && minor == 10 {
        "porting_guide_base"
    } else {
        "porting_guide_core"
    };
    format!("docs/docsite/rst/porting_guides/{basename}_{major}.{minor}.rst")
}

/// PyPI package name of a core release.
///
/// 2.10 shipped as `ansible-base`, later releases as `ansible-core`. Older
/// releases were part of the `ansible` package itself and have no name here.
#[must_use]
pub fn core_package_name(version: &PypiVersion) -> Option<&'static str> {
    match version.major_minor() {
        (2, 10) => Some("ansible-base"),
        (2, minor) if minor > 10 => Some("ansible-core"),
        (major, _) if major > 2 => Some("ansible-core"),
        _ => None,
    }
}

/// Whether an archive member is a collection's changelog.
#[must_use]
pub fn is_collection_changelog(path: &str) -> bool {
    path == "changelogs/changelog.yaml" || path == "changelog.yaml"
}

/// Whether an archive member is ansible-core's changelog.
#[must_use]
pub fn is_core_changelog(path: &str) -> bool {
    path.ends_with("changelogs/changelog.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pypi(v: &str) -> PypiVersion {
        PypiVersion::parse(v).unwrap()
    }

    #[test]
    fn test_porting_guide_path() {
        assert_eq!(
            porting_guide_path(&pypi("2.10.7")),
            "docs/docsite/rst/porting_guides/porting_guide_base_2.10.rst"
        );
        assert_eq!(
            porting_guide_path(&pypi("2.16.0rc1")),
            "docs/docsite/rst/porting_guides/porting_guide_core_2.16.rst"
        );
    }

    #[test]
    fn test_core_package_name() {
        assert_eq!(core_package_name(&pypi("2.10.3")), Some("ansible-base"));
        assert_eq!(core_package_name(&pypi("2.11.0")), Some("ansible-core"));
        assert_eq!(core_package_name(&pypi("3.0.0")), Some("ansible-core"));
        assert_eq!(core_package_name(&pypi("2.9.27")), None);
        assert_eq!(core_package_name(&pypi("1.10.0")), None);
    }

    #[test]
    fn test_archive_matchers() {
        assert!(is_collection_changelog("changelogs/changelog.yaml"));
        assert!(is_collection_changelog("changelog.yaml"));
        assert!(!is_collection_changelog("docs/changelogs/changelog.yaml"));
        assert!(is_core_changelog("ansible-core-2.16.0/changelogs/changelog.yaml"));
    }
}
