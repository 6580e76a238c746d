//! Assembling the changelog of an Ansible major release.
//!
//! [`get_changelog`] reads the dependency manifests of every release,
//! collects the changelog history of ansible-core and every collection,
//! and classifies the collections of each release against its
//! predecessor.

mod entry;

pub use entry::{ChangelogEntry, CollectionChange, CollectionVersion, DependencyTable};

use crate::changelog::ChangelogData;
use crate::collector::{collect_changelogs, CollectionChangelogCollector, CoreChangelogCollector};
use crate::deps::{scan_deps_dir, CollectionsMetadata, DependencyFileData};
use crate::error::{AntsibullError, ErrorContext, Result};
use crate::fetch::ChangelogSource;
use crate::version::PypiVersion;
use std::fmt;
use std::path::Path;

/// Everything [`get_changelog`] needs besides the changelog source.
#[derive(Debug, Clone)]
pub struct ChangelogInputs {
    /// Newest release to describe
    pub ansible_version: PypiVersion,
    pub manifests: Vec<DependencyFileData>,
    pub ansible_changelog: ChangelogData,
    pub metadata: CollectionsMetadata,
}

impl ChangelogInputs {
    pub fn new(ansible_version: PypiVersion, ansible_changelog: ChangelogData) -> Self {
        Self {
            ansible_version,
            manifests: Vec::new(),
            ansible_changelog,
            metadata: CollectionsMetadata::default(),
        }
    }

    /// Load manifests, the Ansible changelog and collection metadata from
    /// a build data directory.
    pub fn from_deps_dir(ansible_version: PypiVersion, deps_dir: &Path) -> Result<Self> {
        let manifests = scan_deps_dir(deps_dir, &ansible_version)?;
        let ansible_changelog = ChangelogData::ansible(Some(deps_dir))?;
        let metadata = CollectionsMetadata::load(Some(deps_dir))?;
        Ok(Self {
            ansible_version,
            manifests,
            ansible_changelog,
            metadata,
        })
    }

    /// Add manifests, replacing loaded ones for the same release.
    #[must_use]
    pub fn with_manifests(mut self, manifests: impl IntoIterator<Item = DependencyFileData>) -> Self {
        self.manifests.extend(manifests);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: CollectionsMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The changelog of an Ansible major release, ready to render.
#[derive(Debug, Clone)]
pub struct Changelog {
    pub ansible_version: PypiVersion,
    pub ansible_ancestor_version: Option<PypiVersion>,
    /// Newest first
    pub entries: Vec<ChangelogEntry>,
    pub core_collector: CoreChangelogCollector,
    pub ansible_changelog: ChangelogData,
    /// Sorted by collection name
    pub collection_collectors: Vec<CollectionChangelogCollector>,
    pub collection_metadata: CollectionsMetadata,
}

impl Changelog {
    /// Collector of a collection.
    #[must_use]
    pub fn collector(&self, collection: &str) -> Option<&CollectionChangelogCollector> {
        self.collection_collectors
            .binary_search_by(|collector| collector.collection().cmp(collection))
            .ok()
            .map(|index| &self.collection_collectors[index])
    }

    /// Collections of the newest release that have no changelog data.
    #[must_use]
    pub fn missing_changelogs(&self) -> MissingChangelogReport {
        let Some(last_entry) = self.entries.first() else {
            return MissingChangelogReport::default();
        };
        let included: Vec<&CollectionChangelogCollector> = self
            .collection_collectors
            .iter()
            .filter(|collector| last_entry.contains_collection(collector.collection()))
            .collect();
        let missing = included
            .iter()
            .filter(|collector| collector.changelog().is_none())
            .map(|collector| MissingChangelog {
                collection: collector.collection().to_string(),
                changelog_url: self
                    .collection_metadata
                    .changelog_url(collector.collection())
                    .map(str::to_string),
            })
            .collect();
        MissingChangelogReport {
            total: included.len(),
            missing,
        }
    }
}

/// A collection without usable changelog data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingChangelog {
    pub collection: String,
    pub changelog_url: Option<String>,
}

/// Collections of the newest release lacking changelog data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingChangelogReport {
    /// Number of collections in the newest release
    pub total: usize,
    pub missing: Vec<MissingChangelog>,
}

impl MissingChangelogReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for MissingChangelogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.missing.is_empty() {
            return Ok(());
        }
        writeln!(
            f,
            "{} out of {} collections have no compatible changelog:",
            self.missing.len(),
            self.total
        )?;
        for entry in &self.missing {
            match &entry.changelog_url {
                Some(url) => writeln!(f, "    {}  (changelog URL: {url})", entry.collection)?,
                None => writeln!(f, "    {}", entry.collection)?,
            }
        }
        Ok(())
    }
}

/// Collect and classify the changelog of every release in `inputs`.
///
/// Missing or broken changelogs only leave collectors empty. Malformed
/// versions in the manifests abort the run.
pub fn get_changelog(
    inputs: ChangelogInputs,
    source: &dyn ChangelogSource,
    thread_max: usize,
) -> Result<Changelog> {
    let ChangelogInputs {
        ansible_version,
        manifests,
        ansible_changelog,
        metadata,
    } = inputs;

    let ansible_ancestor_version = ansible_changelog
        .document()
        .ancestor()
        .map(PypiVersion::parse)
        .transpose()
        .context("ancestor of the Ansible changelog")?;

    let table = DependencyTable::from_manifests(&manifests)?;
    if table.is_empty() {
        return Err(AntsibullError::validation(format!(
            "no dependency manifests found for Ansible {ansible_version}"
        )));
    }

    let core_versions = table
        .core_versions()
        .map(PypiVersion::parse)
        .collect::<Result<Vec<_>>>()
        .context("ansible-core version")?;
    let mut core_collector = CoreChangelogCollector::new(core_versions)?;

    let mut collection_collectors = Vec::new();
    for collection in table.collection_names() {
        let versions = table
            .collection_versions(collection)
            .map(|versions| {
                versions
                    .values()
                    .map(|v| semver::Version::parse(v))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|e| {
                AntsibullError::validation(format!("invalid version of {collection}: {e}"))
            })?
            .unwrap_or_default();
        collection_collectors.push(CollectionChangelogCollector::new(collection, versions)?);
    }

    collect_changelogs(
        &mut collection_collectors,
        &mut core_collector,
        source,
        thread_max,
    )?;

    let releases = table.releases_descending();
    let mut entries = Vec::with_capacity(releases.len());
    for (index, (version, version_str)) in releases.iter().enumerate() {
        let prev_version = releases.get(index + 1).map(|(prev, _)| *prev);
        entries.push(ChangelogEntry::classify(
            &table,
            version,
            version_str,
            prev_version,
            ansible_ancestor_version.as_ref(),
        )?);
    }

    Ok(Changelog {
        ansible_version,
        ansible_ancestor_version,
        entries,
        core_collector,
        ansible_changelog,
        collection_collectors,
        collection_metadata: metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::CollectionMetadata;
    use crate::fetch::MemorySource;
    use indexmap::IndexMap;

    fn manifest(version: &str, core: &str, deps: &[(&str, &str)]) -> DependencyFileData {
        let deps: IndexMap<String, String> = deps
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect();
        DependencyFileData::new(version, core, deps)
    }

    fn inputs() -> ChangelogInputs {
        let ansible = ChangelogData::ansible(None).unwrap();
        ChangelogInputs::new(PypiVersion::parse("9.1.0").unwrap(), ansible).with_manifests(vec![
            manifest("9.0.0", "2.16.0", &[("acme.tools", "1.0.0")]),
            manifest(
                "9.1.0",
                "2.16.1",
                &[("acme.tools", "1.1.0"), ("acme.nolog", "0.1.0")],
            ),
        ])
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_collection(
                "acme.tools",
                "1.1.0",
                "releases:\n  1.0.0: {}\n  1.1.0: {}\n",
            )
            .with_core("2.16.1", "releases:\n  2.16.0: {}\n  2.16.1: {}\n")
    }

    #[test]
    fn test_get_changelog() {
        let changelog = get_changelog(inputs(), &source(), 2).unwrap();
        assert_eq!(changelog.entries.len(), 2);
        assert_eq!(changelog.entries[0].version_str, "9.1.0");
        assert_eq!(
            changelog.entries[0].prev_version,
            Some(PypiVersion::parse("9.0.0").unwrap())
        );
        assert!(changelog.entries[1].prev_version.is_none());
        assert!(changelog.collector("acme.tools").unwrap().changelog().is_some());
        assert!(changelog.collector("acme.nolog").unwrap().changelog().is_none());
        assert!(changelog.collector("acme.other").is_none());
    }

    #[test]
    fn test_missing_changelog_report() {
        let mut metadata = CollectionsMetadata::default();
        metadata.insert(
            "acme.nolog",
            CollectionMetadata {
                changelog_url: Some("https://example.com/nolog".into()),
            },
        );
        let changelog = get_changelog(inputs().with_metadata(metadata), &source(), 1).unwrap();
        let report = changelog.missing_changelogs();
        assert_eq!(report.total, 2);
        assert_eq!(
            report.to_string(),
            "1 out of 2 collections have no compatible changelog:\n    acme.nolog  (changelog URL: https://example.com/nolog)\n"
        );
    }

    #[test]
    fn test_malformed_collection_version_is_fatal() {
        let ansible = ChangelogData::ansible(None).unwrap();
        let inputs = ChangelogInputs::new(PypiVersion::parse("9.0.0").unwrap(), ansible)
            .with_manifests(vec![manifest("9.0.0", "2.16.0", &[("acme.tools", "one")])]);
        assert!(get_changelog(inputs, &MemorySource::new(), 1).is_err());
    }

    #[test]
    fn test_no_manifests() {
        let ansible = ChangelogData::ansible(None).unwrap();
        let inputs = ChangelogInputs::new(PypiVersion::parse("9.0.0").unwrap(), ansible);
        assert!(get_changelog(inputs, &MemorySource::new(), 1).is_err());
    }
}
