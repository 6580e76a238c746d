//! Per-release classification of collections.

use crate::deps::DependencyFileData;
use crate::error::{AntsibullError, ManifestErrorKind, Result};
use crate::version::PypiVersion;
use std::collections::{BTreeMap, HashMap};

/// Versions of every dependency across all known Ansible releases.
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    /// Parsed release version to the spelling used in its manifest
    releases: BTreeMap<PypiVersion, String>,
    core: HashMap<PypiVersion, String>,
    collections: BTreeMap<String, HashMap<PypiVersion, String>>,
}

impl DependencyTable {
    /// Build the table from release manifests.
    ///
    /// A later manifest for the same release replaces an earlier one.
    pub fn from_manifests<'a, I>(manifests: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a DependencyFileData>,
    {
        let mut by_version: BTreeMap<PypiVersion, &DependencyFileData> = BTreeMap::new();
        for manifest in manifests {
            by_version.insert(manifest.ansible_pypi_version()?, manifest);
        }

        let mut table = Self::default();
        for (version, manifest) in by_version {
            if manifest.core_version.trim().is_empty() {
                return Err(AntsibullError::manifest(
                    format!("manifest of Ansible {version}"),
                    ManifestErrorKind::MissingKey("_ansible_core_version".to_string()),
                ));
            }
            table
                .core
                .insert(version.clone(), manifest.core_version.clone());
            for (name, collection_version) in &manifest.deps {
                if name == "_python" {
                    continue;
                }
                table
                    .collections
                    .entry(name.clone())
                    .or_default()
                    .insert(version.clone(), collection_version.clone());
            }
            table
                .releases
                .insert(version, manifest.ansible_version.clone());
        }
        Ok(table)
    }

    /// Release versions with their manifest spelling, newest first.
    #[must_use]
    pub fn releases_descending(&self) -> Vec<(&PypiVersion, &str)> {
        self.releases
            .iter()
            .rev()
            .map(|(version, raw)| (version, raw.as_str()))
            .collect()
    }

    /// Collection names, sorted.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Versions a collection was shipped in, keyed by Ansible release.
    #[must_use]
    pub fn collection_versions(&self, collection: &str) -> Option<&HashMap<PypiVersion, String>> {
        self.collections.get(collection)
    }

    #[must_use]
    pub fn collection_version(&self, collection: &str, release: &PypiVersion) -> Option<&str> {
        self.collections
            .get(collection)
            .and_then(|versions| versions.get(release))
            .map(String::as_str)
    }

    #[must_use]
    pub fn core_version(&self, release: &PypiVersion) -> Option<&str> {
        self.core.get(release).map(String::as_str)
    }

    /// All core versions, one per release.
    pub fn core_versions(&self) -> impl Iterator<Item = &str> {
        self.core.values().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// A collection at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionVersion {
    pub collection: String,
    pub version: String,
}

/// A collection whose changelog contributes to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionChange {
    pub collection: String,
    pub version: String,
    /// Version in the previous release, if it was shipped there
    pub prev_version: Option<String>,
    /// Newly added relative to the previous release
    pub added: bool,
}

/// One Ansible release with its collections classified against the
/// previous release.
///
/// Collections in `added_collections` also appear in `changed_collections`
/// (with `added` set), since their changelog belongs to the release notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub version: PypiVersion,
    /// Version as spelled in its manifest
    pub version_str: String,
    /// Release this one is compared against
    pub prev_version: Option<PypiVersion>,
    /// This release is the changelog's ancestor
    pub is_ancestor: bool,
    pub core_version: String,
    pub prev_core_version: Option<String>,
    pub removed_collections: Vec<CollectionVersion>,
    pub added_collections: Vec<CollectionVersion>,
    pub unchanged_collections: Vec<CollectionVersion>,
    pub changed_collections: Vec<CollectionChange>,
}

impl ChangelogEntry {
    /// Classify every known collection for `version`.
    ///
    /// Without an explicit `prev_version`, the release is compared against
    /// `ancestor`. A collection missing from the ancestor release is not
    /// reported as added, because the ancestor is only a baseline.
    pub fn classify(
        table: &DependencyTable,
        version: &PypiVersion,
        version_str: &str,
        prev_version: Option<&PypiVersion>,
        ancestor: Option<&PypiVersion>,
    ) -> Result<Self> {
        let is_ancestor = ancestor.is_some_and(|ancestor| ancestor == version);
        let prev_version = prev_version.or(ancestor).cloned();
        let prev_is_ancestor = prev_version.is_some() && prev_version.as_ref() == ancestor;

        let core_version = table
            .core_version(version)
            .ok_or_else(|| {
                AntsibullError::manifest(
                    format!("Ansible {version}"),
                    ManifestErrorKind::MissingKey("_ansible_core_version".to_string()),
                )
            })?
            .to_string();
        let prev_core_version = prev_version
            .as_ref()
            .and_then(|prev| table.core_version(prev))
            .map(str::to_string);

        let mut entry = Self {
            version: version.clone(),
            version_str: version_str.to_string(),
            prev_version,
            is_ancestor,
            core_version,
            prev_core_version,
            removed_collections: Vec::new(),
            added_collections: Vec::new(),
            unchanged_collections: Vec::new(),
            changed_collections: Vec::new(),
        };

        for collection in table.collection_names() {
            let current = table.collection_version(collection, version);
            let previous = entry
                .prev_version
                .as_ref()
                .and_then(|prev| table.collection_version(collection, prev));

            let Some(current) = current else {
                if let Some(previous) = previous {
                    entry.removed_collections.push(CollectionVersion {
                        collection: collection.to_string(),
                        version: previous.to_string(),
                    });
                }
                continue;
            };

            let mut added = false;
            if entry.prev_version.is_some() {
                match previous {
                    None if !prev_is_ancestor => {
                        entry.added_collections.push(CollectionVersion {
                            collection: collection.to_string(),
                            version: current.to_string(),
                        });
                        added = true;
                    }
                    Some(previous) if previous == current => {
                        entry.unchanged_collections.push(CollectionVersion {
                            collection: collection.to_string(),
                            version: current.to_string(),
                        });
                        continue;
                    }
                    _ => {}
                }
            }
            entry.changed_collections.push(CollectionChange {
                collection: collection.to_string(),
                version: current.to_string(),
                prev_version: previous.map(str::to_string),
                added,
            });
        }
        Ok(entry)
    }

    /// Whether the collection takes part in this release.
    #[must_use]
    pub fn contains_collection(&self, collection: &str) -> bool {
        self.changed_collections
            .iter()
            .any(|change| change.collection == collection)
            || self
                .unchanged_collections
                .iter()
                .any(|unchanged| unchanged.collection == collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn manifest(version: &str, core: &str, deps: &[(&str, &str)]) -> DependencyFileData {
        let deps: IndexMap<String, String> = deps
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect();
        DependencyFileData::new(version, core, deps)
    }

    fn pypi(v: &str) -> PypiVersion {
        PypiVersion::parse(v).unwrap()
    }

    fn names(list: &[CollectionVersion]) -> Vec<&str> {
        list.iter().map(|c| c.collection.as_str()).collect()
    }

    fn table() -> DependencyTable {
        DependencyTable::from_manifests(&[
            manifest(
                "9.0.0",
                "2.16.0",
                &[("a.one", "1.0.0"), ("b.two", "2.0.0"), ("c.three", "3.0.0")],
            ),
            manifest(
                "9.1.0",
                "2.16.1",
                &[("a.one", "1.0.0"), ("b.two", "2.1.0"), ("d.four", "4.0.0")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_releases_descending() {
        let table = table();
        let releases: Vec<&str> = table
            .releases_descending()
            .into_iter()
            .map(|(_, raw)| raw)
            .collect();
        assert_eq!(releases, vec!["9.1.0", "9.0.0"]);
        assert_eq!(
            table.collection_names().collect::<Vec<_>>(),
            vec!["a.one", "b.two", "c.three", "d.four"]
        );
    }

    #[test]
    fn test_classify_against_previous() {
        let table = table();
        let entry = ChangelogEntry::classify(
            &table,
            &pypi("9.1.0"),
            "9.1.0",
            Some(&pypi("9.0.0")),
            None,
        )
        .unwrap();

        assert_eq!(entry.core_version, "2.16.1");
        assert_eq!(entry.prev_core_version.as_deref(), Some("2.16.0"));
        assert_eq!(names(&entry.unchanged_collections), vec!["a.one"]);
        assert_eq!(names(&entry.removed_collections), vec!["c.three"]);
        assert_eq!(names(&entry.added_collections), vec!["d.four"]);
        assert_eq!(
            entry.changed_collections,
            vec![
                CollectionChange {
                    collection: "b.two".into(),
                    version: "2.1.0".into(),
                    prev_version: Some("2.0.0".into()),
                    added: false,
                },
                CollectionChange {
                    collection: "d.four".into(),
                    version: "4.0.0".into(),
                    prev_version: None,
                    added: true,
                },
            ]
        );
    }

    #[test]
    fn test_first_release_without_ancestor() {
        let table = table();
        let entry = ChangelogEntry::classify(&table, &pypi("9.0.0"), "9.0.0", None, None).unwrap();
        assert!(entry.prev_version.is_none());
        assert!(entry.added_collections.is_empty());
        assert!(entry.unchanged_collections.is_empty());
        assert_eq!(entry.changed_collections.len(), 3);
        assert!(entry
            .changed_collections
            .iter()
            .all(|change| change.prev_version.is_none() && !change.added));
    }

    #[test]
    fn test_ancestor_is_a_baseline() {
        let table = table();
        let entry = ChangelogEntry::classify(
            &table,
            &pypi("9.1.0"),
            "9.1.0",
            None,
            Some(&pypi("9.0.0")),
        )
        .unwrap();
        assert_eq!(entry.prev_version, Some(pypi("9.0.0")));
        assert!(!entry.is_ancestor);
        assert!(entry.added_collections.is_empty());
        let d_four = entry
            .changed_collections
            .iter()
            .find(|change| change.collection == "d.four")
            .unwrap();
        assert!(!d_four.added);
        assert!(d_four.prev_version.is_none());
        assert_eq!(names(&entry.removed_collections), vec!["c.three"]);

        let ancestor = ChangelogEntry::classify(
            &table,
            &pypi("9.0.0"),
            "9.0.0",
            None,
            Some(&pypi("9.0.0")),
        )
        .unwrap();
        assert!(ancestor.is_ancestor);
    }

    #[test]
    fn test_missing_core_version_is_fatal() {
        let table = table();
        assert!(ChangelogEntry::classify(&table, &pypi("8.0.0"), "8.0.0", None, None).is_err());
        assert!(DependencyTable::from_manifests(&[manifest("9.0.0", " ", &[])]).is_err());
    }
}
