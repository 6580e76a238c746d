//! Property-based tests for versions, changelog documents and release
//! classification.
//!
//! Ensures parsing handles arbitrary input without panicking, and that
//! pruning, merging and classification keep their invariants across
//! random inputs.

use antsibull::aggregate::{ChangelogEntry, DependencyTable};
use antsibull::changelog::{ChangelogConfig, ChangesDocument, ReleaseEntry, SectionContent};
use antsibull::render::{core_porting_guide_body, optimize_release_entry};
use antsibull::{DependencyFileData, PypiVersion};
use indexmap::IndexMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn document_yaml(ancestor: Option<(u8, u8)>, versions: &BTreeSet<(u8, u8)>) -> String {
    let mut yaml = match ancestor {
        Some((minor, patch)) => format!("ancestor: 0.{minor}.{patch}\n"),
        None => "ancestor: null\n".to_string(),
    };
    yaml.push_str("releases:\n");
    for (minor, patch) in versions {
        yaml.push_str(&format!("  1.{minor}.{patch}:\n    release_date: '2024-01-01'\n"));
    }
    yaml
}

fn collection_document(ancestor: Option<(u8, u8)>, versions: &BTreeSet<(u8, u8)>) -> ChangesDocument {
    let config = ChangelogConfig::collection("acme.tools");
    ChangesDocument::from_yaml(document_yaml(ancestor, versions).as_bytes(), &config)
        .expect("generated document is valid")
}

fn manifest(release: u8, deps: &BTreeMap<String, u8>) -> DependencyFileData {
    let deps: IndexMap<String, String> = deps
        .iter()
        .map(|(name, version)| (name.clone(), format!("1.{version}.0")))
        .collect();
    DependencyFileData::new(format!("9.{release}.0"), "2.16.0", deps)
}

fn collections() -> impl Strategy<Value = BTreeMap<String, u8>> {
    prop::collection::btree_map("acme\\.[a-e]", 0u8..3, 0..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn pypi_parse_doesnt_panic(s in "\\PC{0,40}") {
        let _ = PypiVersion::parse(&s);
    }

    #[test]
    fn pypi_release_ordering_matches_tuples(
        a in (0u16..50, 0u16..50, 0u16..50),
        b in (0u16..50, 0u16..50, 0u16..50),
    ) {
        let va = PypiVersion::parse(&format!("{}.{}.{}", a.0, a.1, a.2)).unwrap();
        let vb = PypiVersion::parse(&format!("{}.{}.{}", b.0, b.1, b.2)).unwrap();
        prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
    }

    #[test]
    fn pypi_prerelease_sorts_before_release(
        v in (0u16..50, 0u16..50, 0u16..50),
        kind in prop::sample::select(vec!["a", "b", "rc"]),
        n in 0u16..10,
    ) {
        let release = PypiVersion::parse(&format!("{}.{}.{}", v.0, v.1, v.2)).unwrap();
        let pre = PypiVersion::parse(&format!("{}.{}.{}{kind}{n}", v.0, v.1, v.2)).unwrap();
        prop_assert!(pre < release);
    }

    #[test]
    fn prune_keeps_only_versions_in_range(
        versions in prop::collection::btree_set((0u8..6, 0u8..6), 1..12),
        after in prop::option::of((0u8..6, 0u8..6)),
        until in prop::option::of((0u8..6, 0u8..6)),
    ) {
        let after_str = after.map(|(minor, patch)| format!("1.{minor}.{patch}"));
        let until_str = until.map(|(minor, patch)| format!("1.{minor}.{patch}"));

        let mut document = collection_document(None, &versions);
        document
            .prune_versions(after_str.as_deref(), until_str.as_deref())
            .unwrap();

        let expected: BTreeSet<String> = versions
            .iter()
            .filter(|v| after.map_or(true, |a| **v > a))
            .filter(|v| until.map_or(true, |u| **v <= u))
            .map(|(minor, patch)| format!("1.{minor}.{patch}"))
            .collect();
        let kept: BTreeSet<String> = document.releases().keys().cloned().collect();
        prop_assert_eq!(&kept, &expected);

        let once = document.clone();
        document
            .prune_versions(after_str.as_deref(), until_str.as_deref())
            .unwrap();
        prop_assert_eq!(document, once);
    }

    #[test]
    fn concatenate_keeps_smallest_ancestor(
        first in prop::collection::btree_set((0u8..6, 0u8..6), 0..6),
        second in prop::collection::btree_set((0u8..6, 0u8..6), 0..6),
        first_ancestor in prop::option::of((0u8..6, 0u8..6)),
        second_ancestor in prop::option::of((0u8..6, 0u8..6)),
    ) {
        let merged = ChangesDocument::concatenate(vec![
            collection_document(first_ancestor, &first),
            collection_document(second_ancestor, &second),
        ])
        .unwrap();

        let expected_ancestor = [first_ancestor, second_ancestor]
            .into_iter()
            .flatten()
            .min()
            .map(|(minor, patch)| format!("0.{minor}.{patch}"));
        prop_assert_eq!(merged.ancestor().map(str::to_string), expected_ancestor);

        let expected: BTreeSet<&(u8, u8)> = first.iter().chain(&second).collect();
        prop_assert_eq!(merged.releases().len(), expected.len());
    }

    #[test]
    fn optimize_dedups_and_sorts_items(
        items in prop::collection::vec("[a-d]{1,3}", 0..20),
        summary in "[A-Za-z ]{0,30}",
    ) {
        let mut entry = ReleaseEntry::new("1.0.0");
        entry.changes.insert("release_summary".into(), SectionContent::Prose(summary.clone()));
        entry.changes.insert("bugfixes".into(), SectionContent::Items(items.clone()));

        let optimized = optimize_release_entry(entry);
        let expected: Vec<String> = items.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(
            optimized.changes.get("bugfixes"),
            Some(&SectionContent::Items(expected))
        );
        prop_assert_eq!(
            optimized.changes.get("release_summary"),
            Some(&SectionContent::Prose(summary))
        );

        let again = optimize_release_entry(optimized.clone());
        prop_assert_eq!(again, optimized);
    }

    #[test]
    fn classification_covers_every_collection(
        previous in collections(),
        current in collections(),
    ) {
        let manifests = vec![manifest(0, &previous), manifest(1, &current)];
        let table = DependencyTable::from_manifests(&manifests).unwrap();
        let version = PypiVersion::parse("9.1.0").unwrap();
        let prev = PypiVersion::parse("9.0.0").unwrap();
        let entry = ChangelogEntry::classify(&table, &version, "9.1.0", Some(&prev), None).unwrap();

        let changed: BTreeSet<&str> = entry
            .changed_collections
            .iter()
            .map(|c| c.collection.as_str())
            .collect();
        let unchanged: BTreeSet<&str> = entry
            .unchanged_collections
            .iter()
            .map(|c| c.collection.as_str())
            .collect();
        prop_assert!(changed.is_disjoint(&unchanged));
        let included: BTreeSet<&str> = changed.union(&unchanged).copied().collect();
        let expected: BTreeSet<&str> = current.keys().map(String::as_str).collect();
        prop_assert_eq!(included, expected);

        for added in &entry.added_collections {
            prop_assert!(!previous.contains_key(&added.collection));
            prop_assert!(changed.contains(added.collection.as_str()));
        }
        for removed in &entry.removed_collections {
            prop_assert!(previous.contains_key(&removed.collection));
            prop_assert!(!current.contains_key(&removed.collection));
        }
        for unchanged in &entry.unchanged_collections {
            prop_assert_eq!(previous.get(&unchanged.collection), current.get(&unchanged.collection));
        }
    }

    #[test]
    fn porting_guide_body_doesnt_panic(s in "\\PC{0,200}") {
        let _ = core_porting_guide_body(&s);
    }
}
