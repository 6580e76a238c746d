//! Ancestor-chain walking shared by collection and core collectors.

use crate::changelog::ChangelogData;
use crate::error::Result;
use crate::version::SchemeVersion;
use std::collections::BTreeSet;

/// Resolves the history needed to explain a set of versions of one
/// dependency.
///
/// `fetch` returns the changelog as released in a given version. Fetch and
/// parse failures are data gaps: they are logged and end the current walk.
pub struct HistoryResolver<'a, F> {
    label: &'a str,
    earliest: &'a SchemeVersion,
    fetch: F,
}

impl<'a, F> HistoryResolver<'a, F>
where
    F: Fn(&SchemeVersion) -> Result<Option<ChangelogData>>,
{
    pub fn new(label: &'a str, earliest: &'a SchemeVersion, fetch: F) -> Self {
        Self {
            label,
            earliest,
            fetch,
        }
    }

    /// Changelog as of `version`, pruned to releases up to `version`.
    fn fetch_pruned(&self, version: &SchemeVersion) -> Option<ChangelogData> {
        let until = version.to_string();
        let result = (self.fetch)(version).and_then(|changelog| match changelog {
            Some(mut data) => {
                data.document_mut().prune_versions(None, Some(&until))?;
                Ok(Some(data))
            }
            None => Ok(None),
        });
        match result {
            Ok(Some(data)) => Some(data),
            Ok(None) => {
                tracing::debug!("No changelog found for {} {version}", self.label);
                None
            }
            Err(e) => {
                tracing::warn!("Cannot load changelog of {} {version}: {e}", self.label);
                None
            }
        }
    }

    /// Fetch the changelog of `start` and follow its ancestors back to the
    /// earliest required version, then merge the chain.
    ///
    /// The walk stops at the first ancestor that is older than the earliest
    /// required version, cannot be fetched, or does not precede the version
    /// it was reached from.
    pub fn walk(&self, start: &SchemeVersion) -> Option<ChangelogData> {
        let first = self.fetch_pruned(start)?;
        let mut previous = start.clone();
        let mut chain = vec![first];

        loop {
            let ancestor = match chain.last().map(|data| data.document().ancestor_version()) {
                Some(Ok(Some(ancestor))) => ancestor,
                Some(Ok(None)) | None => break,
                Some(Err(e)) => {
                    tracing::warn!("Ignoring invalid ancestor in {} {previous}: {e}", self.label);
                    break;
                }
            };
            if ancestor < *self.earliest {
                break;
            }
            if ancestor >= previous {
                tracing::warn!(
                    "Ancestor {ancestor} of {} {previous} does not precede it; stopping",
                    self.label
                );
                break;
            }
            tracing::debug!("Following {} ancestor {previous} -> {ancestor}", self.label);
            let Some(next) = self.fetch_pruned(&ancestor) else {
                break;
            };
            chain.push(next);
            previous = ancestor;
        }

        match ChangelogData::concatenate(chain) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Cannot merge changelog history of {}: {e}", self.label);
                None
            }
        }
    }

    /// Explain every version in `targets`.
    ///
    /// Repeatedly walks from the newest unexplained version. The first
    /// successful walk is taken whole. Later walks only contribute the
    /// releases that are still missing, so releases of a backport branch
    /// that no target needs stay out. Every walk removes its start version
    /// from the missing set, so the loop always terminates.
    pub fn resolve(&self, targets: &[SchemeVersion]) -> Option<ChangelogData> {
        let mut missing: BTreeSet<SchemeVersion> = targets.iter().cloned().collect();
        let mut merged: Option<ChangelogData> = None;

        while let Some(version) = missing.pop_last() {
            let Some(chain) = self.walk(&version) else {
                continue;
            };
            match merged.as_mut() {
                None => {
                    let scheme = chain.document().scheme();
                    for key in chain.document().releases().keys() {
                        if let Ok(parsed) = scheme.parse(key) {
                            missing.remove(&parsed);
                        }
                    }
                    merged = Some(chain);
                }
                Some(current) => merge_branch(self.label, current, &chain, &mut missing),
            }
        }
        merged
    }
}

/// Copy the releases of `branch` that are still in `missing`.
///
/// Releases both sides know keep the content of `current`. The merged
/// ancestor is the older of the two.
fn merge_branch(
    label: &str,
    current: &mut ChangelogData,
    branch: &ChangelogData,
    missing: &mut BTreeSet<SchemeVersion>,
) {
    let scheme = branch.document().scheme();
    for (version, record) in branch.document().releases() {
        if let Some(existing) = current.document().release(version) {
            if existing != record {
                tracing::warn!(
                    "Release {version} of {label} differs between release branches; keeping the first one"
                );
            }
            continue;
        }
        let Ok(parsed) = scheme.parse(version) else {
            continue;
        };
        if missing.remove(&parsed) {
            current
                .document_mut()
                .insert_release_if_absent(version, record.clone());
        }
    }

    let older = match (
        current.document().ancestor_version(),
        branch.document().ancestor_version(),
    ) {
        (Ok(Some(mine)), Ok(Some(theirs))) => theirs < mine,
        (Ok(None), Ok(Some(_))) => true,
        _ => false,
    };
    if older {
        let ancestor = branch.document().ancestor().map(str::to_string);
        if let Err(e) = current.document_mut().set_ancestor(ancestor) {
            tracing::warn!("Ignoring ancestor of {label}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionScheme;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn semver(v: &str) -> SchemeVersion {
        VersionScheme::Semantic.parse(v).unwrap()
    }

    fn documents(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(v, yaml)| ((*v).to_string(), (*yaml).to_string()))
            .collect()
    }

    fn fetcher<'a>(
        docs: &'a HashMap<String, String>,
        log: &'a RefCell<Vec<String>>,
    ) -> impl Fn(&SchemeVersion) -> Result<Option<ChangelogData>> + 'a {
        move |version| {
            log.borrow_mut().push(version.to_string());
            docs.get(&version.to_string())
                .map(|yaml| ChangelogData::collection("acme.tools", yaml.as_bytes()))
                .transpose()
        }
    }

    fn versions(data: &ChangelogData) -> Vec<String> {
        let mut keys: Vec<String> = data.document().releases().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_linear_chain() {
        let docs = documents(&[
            (
                "1.0.2",
                "ancestor: 1.0.0\nreleases:\n  1.0.1: {}\n  1.0.2: {}\n",
            ),
            ("1.0.0", "ancestor: null\nreleases:\n  1.0.0: {}\n"),
        ]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.0");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        let merged = resolver
            .resolve(&[semver("1.0.0"), semver("1.0.2")])
            .unwrap();
        assert_eq!(versions(&merged), vec!["1.0.0", "1.0.1", "1.0.2"]);
        assert_eq!(merged.document().ancestor(), None);
        assert_eq!(*log.borrow(), vec!["1.0.2", "1.0.0"]);
    }

    #[test]
    fn test_walk_stops_before_earliest() {
        let docs = documents(&[
            ("2.0.0", "ancestor: 1.0.0\nreleases:\n  2.0.0: {}\n"),
            ("1.0.0", "releases:\n  1.0.0: {}\n"),
        ]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.5.0");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        let merged = resolver.resolve(&[semver("2.0.0")]).unwrap();
        assert_eq!(versions(&merged), vec!["2.0.0"]);
        assert_eq!(merged.document().ancestor(), Some("1.0.0"));
        assert_eq!(*log.borrow(), vec!["2.0.0"]);
    }

    #[test]
    fn test_divergent_branches_are_merged_once() {
        let docs = documents(&[
            (
                "1.1.0",
                "ancestor: 1.0.0\nreleases:\n  1.0.1: {}\n  1.0.2: {}\n  1.1.0: {}\n",
            ),
            (
                "1.0.3",
                "ancestor: 1.0.0\nreleases:\n  1.0.1: {}\n  1.0.2: {}\n  1.0.3:\n    release_date: '2024-01-01'\n",
            ),
        ]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.2");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        let merged = resolver
            .resolve(&[semver("1.0.2"), semver("1.0.3"), semver("1.1.0")])
            .unwrap();
        assert_eq!(versions(&merged), vec!["1.0.1", "1.0.2", "1.0.3", "1.1.0"]);
        assert_eq!(
            merged.document().release("1.0.3").unwrap().release_date.as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(*log.borrow(), vec!["1.1.0", "1.0.3"]);
    }

    #[test]
    fn test_backport_branch_contributes_only_missing_releases() {
        let docs = documents(&[
            ("1.1.0", "ancestor: null\nreleases:\n  1.0.0: {}\n  1.1.0: {}\n"),
            (
                "1.0.2",
                "ancestor: null\nreleases:\n  1.0.0: {}\n  1.0.1: {}\n  1.0.2: {}\n",
            ),
        ]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.2");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        let merged = resolver
            .resolve(&[semver("1.0.2"), semver("1.1.0")])
            .unwrap();
        assert_eq!(versions(&merged), vec!["1.0.0", "1.0.2", "1.1.0"]);
        assert_eq!(*log.borrow(), vec!["1.1.0", "1.0.2"]);
    }

    #[test]
    fn test_conflicting_branch_keeps_first() {
        let docs = documents(&[
            (
                "1.1.0",
                "releases:\n  1.0.0:\n    codename: main\n  1.1.0: {}\n",
            ),
            ("1.0.1", "releases:\n  1.0.0:\n    codename: branch\n  1.0.1: {}\n"),
        ]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.1");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        let merged = resolver
            .resolve(&[semver("1.0.1"), semver("1.1.0")])
            .unwrap();
        assert_eq!(
            merged.document().release("1.0.0").unwrap().codename.as_deref(),
            Some("main")
        );
        assert!(merged.document().release("1.0.1").is_some());
    }

    #[test]
    fn test_missing_data_terminates() {
        let docs = documents(&[]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.0");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        assert!(resolver
            .resolve(&[semver("1.0.0"), semver("1.1.0"), semver("1.2.0")])
            .is_none());
        assert_eq!(*log.borrow(), vec!["1.2.0", "1.1.0", "1.0.0"]);
    }

    #[test]
    fn test_self_referencing_ancestor_stops() {
        let docs = documents(&[("1.1.0", "ancestor: 1.1.0\nreleases:\n  1.1.0: {}\n")]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.0");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));

        let merged = resolver.resolve(&[semver("1.1.0")]).unwrap();
        assert_eq!(versions(&merged), vec!["1.1.0"]);
        assert_eq!(*log.borrow(), vec!["1.1.0"]);
    }

    #[test]
    fn test_broken_document_is_a_gap() {
        let docs = documents(&[("1.0.0", "releases: [not, a, mapping]\n")]);
        let log = RefCell::new(Vec::new());
        let earliest = semver("1.0.0");
        let resolver = HistoryResolver::new("acme.tools", &earliest, fetcher(&docs, &log));
        assert!(resolver.resolve(&[semver("1.0.0")]).is_none());
    }
}
