//! Versioned changelog documents (`changelog.yaml`).
//!
//! A document maps version strings to release records and may name an
//! ancestor: the version whose own document continues the history.
//! Documents are validated when parsed, so every stored version key is
//! known to parse under the document's scheme.

use super::config::{ChangelogConfig, ChangesFormat};
use super::resolver::ChangelogFragment;
use crate::error::{AntsibullError, ErrorContext, OptionContext, ParseErrorKind, Result};
use crate::version::{SchemeVersion, VersionScheme};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

// ============================================================================
// Raw YAML shapes
// ============================================================================

/// A version used as a YAML key or scalar.
///
/// Unquoted versions like `2.10` reach the parser as numbers; they are
/// accepted and turned back into strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VersionKey(String);

impl<'de> Deserialize<'de> for VersionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct KeyVisitor;

        impl serde::de::Visitor<'_> for KeyVisitor {
            type Value = VersionKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a version string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<VersionKey, E> {
                Ok(VersionKey(v.to_string()))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<VersionKey, E> {
                Ok(VersionKey(v.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<VersionKey, E> {
                Ok(VersionKey(v.to_string()))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<VersionKey, E> {
                Ok(VersionKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl Serialize for VersionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawDocument {
    #[serde(default)]
    ancestor: Option<VersionKey>,
    #[serde(default)]
    releases: Option<IndexMap<VersionKey, ReleaseRecord>>,
}

// ============================================================================
// Release records
// ============================================================================

/// Description of a plugin, module, or object introduced in a release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginDescription {
    #[serde(default)]
    pub description: Option<String>,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl PluginDescription {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            name: name.into(),
            namespace: None,
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// A plugin entry: full description (combined format) or bare name (classic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginRef {
    Described(PluginDescription),
    Named(String),
}

impl PluginRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Described(plugin) => &plugin.name,
            Self::Named(name) => name,
        }
    }
}

/// Content of one change section: prose for the prelude, items otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    Prose(String),
    Items(Vec<String>),
}

impl SectionContent {
    /// Items of a list section; prose yields a single item.
    #[must_use]
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::Prose(text) => vec![text.as_str()],
            Self::Items(items) => items.iter().map(String::as_str).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Prose(text) => text.trim().is_empty(),
            Self::Items(items) => items.is_empty(),
        }
    }
}

/// Changes of one release, keyed by section name.
pub type ReleaseChanges = IndexMap<String, SectionContent>;

/// One release in a changelog document.
///
/// Fields are declared in alphabetical order so serialized documents keep
/// the key order of hand-maintained files.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReleaseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<ReleaseChanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<PluginRef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub objects: IndexMap<String, Vec<PluginRef>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub plugins: IndexMap<String, Vec<PluginRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(flatten)]
    unknown: IndexMap<String, serde_yaml::Value>,
}

impl ReleaseRecord {
    /// An otherwise empty release published on `release_date`.
    pub fn dated(release_date: impl Into<String>) -> Self {
        Self {
            release_date: Some(release_date.into()),
            ..Self::default()
        }
    }

    fn plugin_refs(&self) -> impl Iterator<Item = &PluginRef> {
        self.modules
            .iter()
            .chain(self.plugins.values().flatten())
            .chain(self.objects.values().flatten())
    }

    fn sort(&mut self, config_prelude: &str) {
        self.modules.sort_by(|a, b| a.name().cmp(b.name()));
        for list in self.plugins.values_mut().chain(self.objects.values_mut()) {
            list.sort_by(|a, b| a.name().cmp(b.name()));
        }
        self.plugins.sort_keys();
        self.objects.sort_keys();
        self.fragments.sort();
        if let Some(changes) = self.changes.as_mut() {
            changes.sort_keys();
            for (section, content) in changes.iter_mut() {
                if section == config_prelude {
                    continue;
                }
                if let SectionContent::Items(items) = content {
                    items.sort();
                }
            }
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// A parsed, validated changelog document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangesDocument {
    scheme: VersionScheme,
    format: ChangesFormat,
    prelude_name: String,
    ancestor: Option<String>,
    releases: IndexMap<String, ReleaseRecord>,
}

impl ChangesDocument {
    /// An empty document with no ancestor.
    #[must_use]
    pub fn empty(config: &ChangelogConfig) -> Self {
        Self {
            scheme: config.scheme,
            format: config.format,
            prelude_name: config.prelude_name.clone(),
            ancestor: None,
            releases: IndexMap::new(),
        }
    }

    /// Parse a document from YAML bytes.
    pub fn from_yaml(bytes: &[u8], config: &ChangelogConfig) -> Result<Self> {
        let raw: RawDocument = serde_yaml::from_slice(bytes)?;
        Self::from_raw(raw, config)
    }

    /// Build a document from already-loaded YAML data.
    pub fn from_value(value: serde_yaml::Value, config: &ChangelogConfig) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::empty(config));
        }
        let raw: RawDocument = serde_yaml::from_value(value)?;
        Self::from_raw(raw, config)
    }

    /// Load a document from disk; a missing file yields an empty document.
    pub fn load(path: &Path, config: &ChangelogConfig) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty(config));
        }
        let bytes = std::fs::read(path).map_err(|e| AntsibullError::io(path, e))?;
        Self::from_yaml(&bytes, config).with_context(|| format!("loading {}", path.display()))
    }

    fn from_raw(raw: RawDocument, config: &ChangelogConfig) -> Result<Self> {
        let scheme = config.scheme;
        let ancestor = raw.ancestor.map(|key| key.0);
        if let Some(ancestor) = &ancestor {
            scheme.parse(ancestor).context("ancestor")?;
        }

        let mut releases = IndexMap::new();
        for (key, mut record) in raw.releases.unwrap_or_default() {
            let version = key.0;
            scheme
                .parse(&version)
                .with_context(|| format!("releases -> {version}"))?;
            if !record.unknown.is_empty() {
                let keys: Vec<&String> = record.unknown.keys().collect();
                tracing::debug!("Ignoring unknown keys {keys:?} in release {version}");
                record.unknown.clear();
            }
            check_format(&record, config.format)
                .with_context(|| format!("releases -> {version}"))?;
            releases.insert(version, record);
        }

        Ok(Self {
            scheme,
            format: config.format,
            prelude_name: config.prelude_name.clone(),
            ancestor,
            releases,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> VersionScheme {
        self.scheme
    }

    #[must_use]
    pub fn format(&self) -> ChangesFormat {
        self.format
    }

    /// Version at which this document's history continues elsewhere.
    #[must_use]
    pub fn ancestor(&self) -> Option<&str> {
        self.ancestor.as_deref()
    }

    pub fn set_ancestor(&mut self, ancestor: Option<String>) -> Result<()> {
        if let Some(ancestor) = &ancestor {
            self.scheme.parse(ancestor).context("ancestor")?;
        }
        self.ancestor = ancestor;
        Ok(())
    }

    /// Parsed ancestor version.
    pub fn ancestor_version(&self) -> Result<Option<SchemeVersion>> {
        self.ancestor
            .as_deref()
            .map(|ancestor| self.scheme.parse(ancestor))
            .transpose()
    }

    #[must_use]
    pub fn releases(&self) -> &IndexMap<String, ReleaseRecord> {
        &self.releases
    }

    #[must_use]
    pub fn release(&self, version: &str) -> Option<&ReleaseRecord> {
        self.releases.get(version)
    }

    pub fn release_mut(&mut self, version: &str) -> Option<&mut ReleaseRecord> {
        self.releases.get_mut(version)
    }

    #[must_use]
    pub fn has_release(&self) -> bool {
        !self.releases.is_empty()
    }

    /// Release versions, newest first.
    pub fn versions_descending(&self) -> Result<Vec<(SchemeVersion, String)>> {
        self.scheme.sort_descending(self.releases.keys())
    }

    /// Newest release version, if any.
    pub fn latest_version(&self) -> Result<Option<String>> {
        Ok(self
            .versions_descending()?
            .into_iter()
            .next()
            .map(|(_, raw)| raw))
    }

    /// Drop every release with `version <= after` or `version > until`.
    pub fn prune_versions(&mut self, after: Option<&str>, until: Option<&str>) -> Result<()> {
        let after = after.map(|v| self.scheme.parse(v)).transpose()?;
        let until = until.map(|v| self.scheme.parse(v)).transpose()?;

        let mut keep = Vec::with_capacity(self.releases.len());
        for version in self.releases.keys() {
            let parsed = self.scheme.parse(version)?;
            keep.push(parsed.in_range(after.as_ref(), until.as_ref()));
        }
        let mut keep = keep.into_iter();
        self.releases.retain(|_, _| keep.next().unwrap_or(true));
        Ok(())
    }

    /// Merge documents into one.
    ///
    /// Releases from later documents replace same-version releases from
    /// earlier ones. The merged ancestor is the smallest ancestor among the
    /// inputs. Scheme and format are taken from the last document.
    ///
    /// # Panics
    ///
    /// Panics when `documents` is empty.
    pub fn concatenate(documents: Vec<ChangesDocument>) -> Result<ChangesDocument> {
        assert!(
            !documents.is_empty(),
            "cannot concatenate an empty list of changelog documents"
        );

        let (scheme, format, prelude_name) = match documents.last() {
            Some(last) => (last.scheme, last.format, last.prelude_name.clone()),
            None => unreachable!(),
        };

        let mut releases = IndexMap::new();
        let mut ancestor: Option<(SchemeVersion, String)> = None;
        for document in documents {
            if let Some(candidate) = document.ancestor {
                let parsed = scheme.parse(&candidate)?;
                let replace = ancestor
                    .as_ref()
                    .map_or(true, |(current, _)| parsed < *current);
                if replace {
                    ancestor = Some((parsed, candidate));
                }
            }
            releases.extend(document.releases);
        }

        Ok(ChangesDocument {
            scheme,
            format,
            prelude_name,
            ancestor: ancestor.map(|(_, raw)| raw),
            releases,
        })
    }

    /// Insert `record` for `version` unless the version is already present.
    ///
    /// Returns `true` when the record was inserted.
    pub fn insert_release_if_absent(&mut self, version: &str, record: ReleaseRecord) -> bool {
        if self.releases.contains_key(version) {
            return false;
        }
        self.releases.insert(version.to_string(), record);
        true
    }

    /// Add a new release. Returns `false` (and warns) if it already exists.
    pub fn add_release(
        &mut self,
        version: &str,
        release_date: chrono::NaiveDate,
        codename: Option<&str>,
    ) -> Result<bool> {
        self.scheme.parse(version)?;
        if self.releases.contains_key(version) {
            tracing::warn!("Release {version} already exists");
            return Ok(false);
        }
        self.releases.insert(
            version.to_string(),
            ReleaseRecord {
                release_date: Some(release_date.format("%Y-%m-%d").to_string()),
                codename: codename.map(str::to_string),
                ..ReleaseRecord::default()
            },
        );
        Ok(true)
    }

    /// Record a changelog fragment for an existing release.
    ///
    /// Returns `false` when the fragment was already recorded. A second
    /// prelude or an unknown section is an error.
    pub fn add_fragment(
        &mut self,
        fragment: &ChangelogFragment,
        version: &str,
        config: &ChangelogConfig,
    ) -> Result<bool> {
        let format = self.format;
        let release = self
            .releases
            .get_mut(version)
            .with_context_none(|| format!("release {version} does not exist"))?;
        if release.fragments.iter().any(|name| name == &fragment.name) {
            return Ok(false);
        }

        for section in fragment.content.keys() {
            if !config.is_known_section(section) {
                return Err(AntsibullError::validation(format!(
                    "Found unknown section \"{section}\" in fragment {}",
                    fragment.name
                )));
            }
        }

        if format == ChangesFormat::Combined {
            let changes = release.changes.get_or_insert_with(IndexMap::new);
            for (section, content) in &fragment.content {
                if config.is_prelude(section) {
                    if changes.contains_key(section) {
                        return Err(AntsibullError::validation(format!(
                            "Found prelude section \"{section}\" more than once"
                        )));
                    }
                    changes.insert(section.clone(), content.clone());
                    continue;
                }
                let entry = changes
                    .entry(section.clone())
                    .or_insert_with(|| SectionContent::Items(Vec::new()));
                match entry {
                    SectionContent::Items(items) => {
                        items.extend(content.items().into_iter().map(str::to_string));
                    }
                    SectionContent::Prose(_) => {
                        return Err(AntsibullError::invalid_value(
                            section.clone(),
                            "expected a list of changes",
                        ));
                    }
                }
            }
        }

        release.fragments.push(fragment.name.clone());
        Ok(true)
    }

    /// Record a new plugin for a release, unless the same `type/name` is
    /// already recorded in any release. Modules use the type `module`.
    pub fn add_plugin(
        &mut self,
        plugin_type: &str,
        plugin: PluginDescription,
        version: &str,
    ) -> Result<bool> {
        let composite = format!("{plugin_type}/{}", plugin.name);
        if self.known_plugins().contains(&composite) {
            return Ok(false);
        }

        let entry = match self.format {
            ChangesFormat::Combined => PluginRef::Described(plugin),
            ChangesFormat::Classic => PluginRef::Named(plugin.name),
        };
        let release = self
            .releases
            .get_mut(version)
            .with_context_none(|| format!("release {version} does not exist"))?;
        if plugin_type == "module" {
            release.modules.push(entry);
        } else {
            release
                .plugins
                .entry(plugin_type.to_string())
                .or_default()
                .push(entry);
        }
        Ok(true)
    }

    fn known_plugins(&self) -> HashSet<String> {
        let mut known = HashSet::new();
        for release in self.releases.values() {
            for module in &release.modules {
                known.insert(format!("module/{}", module.name()));
            }
            for (plugin_type, plugins) in &release.plugins {
                for plugin in plugins {
                    known.insert(format!("{plugin_type}/{}", plugin.name()));
                }
            }
        }
        known
    }

    /// Sort all release data in place.
    ///
    /// Releases are ordered by version; plugins by name; fragments and
    /// section keys lexically; list sections by content. The prelude keeps
    /// its text unchanged.
    pub fn sort(&mut self) -> Result<()> {
        let order = self.scheme.sort_descending(self.releases.keys())?;
        let mut unsorted = std::mem::take(&mut self.releases);
        for (_, version) in order.into_iter().rev() {
            if let Some(mut record) = unsorted.swap_remove(&version) {
                record.sort(&self.prelude_name);
                self.releases.insert(version, record);
            }
        }
        Ok(())
    }

    /// Serialize to YAML after sorting.
    pub fn to_yaml(&self) -> Result<String> {
        let mut sorted = self.clone();
        sorted.sort()?;
        let raw = RawDocument {
            ancestor: sorted.ancestor.map(VersionKey),
            releases: Some(
                sorted
                    .releases
                    .into_iter()
                    .map(|(version, record)| (VersionKey(version), record))
                    .collect(),
            ),
        };
        Ok(serde_yaml::to_string(&raw)?)
    }

    /// Sort and write to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| AntsibullError::io(path, e))
    }
}

fn check_format(record: &ReleaseRecord, format: ChangesFormat) -> Result<()> {
    let mismatch = record.plugin_refs().find(|entry| {
        matches!(
            (format, entry),
            (ChangesFormat::Combined, PluginRef::Named(_))
                | (ChangesFormat::Classic, PluginRef::Described(_))
        )
    });
    if let Some(entry) = mismatch {
        return Err(AntsibullError::parse(
            "release record",
            ParseErrorKind::FormatMismatch {
                expected: format!("{format:?}").to_lowercase(),
                message: format!("unexpected plugin entry '{}'", entry.name()),
            },
        ));
    }
    if format == ChangesFormat::Classic && record.changes.is_some() {
        return Err(AntsibullError::parse(
            "release record",
            ParseErrorKind::FormatMismatch {
                expected: "classic".to_string(),
                message: "inline changes are not allowed".to_string(),
            },
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
ancestor: 1.0.0
releases:
  1.1.0:
    release_date: '2021-02-01'
    changes:
      release_summary: Feature release.
      minor_changes:
        - zeta - added option.
        - alpha - added option.
    modules:
      - name: zmod
        namespace: ''
        description: Z module
      - name: amod
        namespace: ''
        description: A module
    fragments:
      - b.yml
      - a.yml
  1.0.1:
    release_date: '2021-01-15'
    changes:
      bugfixes:
        - fix crash.
    plugins:
      lookup:
        - name: thing
          namespace: null
          description: Look up things
"#;

    fn config() -> ChangelogConfig {
        ChangelogConfig::collection("acme.tools")
    }

    fn sample() -> ChangesDocument {
        ChangesDocument::from_yaml(SAMPLE.as_bytes(), &config()).unwrap()
    }

    fn with_releases(versions: &[&str], ancestor: Option<&str>) -> ChangesDocument {
        let mut doc = ChangesDocument::empty(&config());
        doc.set_ancestor(ancestor.map(str::to_string)).unwrap();
        for v in versions {
            doc.insert_release_if_absent(v, ReleaseRecord::default());
        }
        doc
    }

    #[test]
    fn test_parse_sample() {
        let doc = sample();
        assert_eq!(doc.ancestor(), Some("1.0.0"));
        assert_eq!(doc.releases().len(), 2);
        assert_eq!(doc.latest_version().unwrap().as_deref(), Some("1.1.0"));
        let release = doc.release("1.0.1").unwrap();
        assert_eq!(release.plugins["lookup"][0].name(), "thing");
    }

    #[test]
    fn test_numeric_keys_are_accepted() {
        let yaml = "ancestor: null\nreleases:\n  2.10:\n    release_date: '2020-09-22'\n";
        let doc = ChangesDocument::from_yaml(yaml.as_bytes(), &ChangelogConfig::ansible()).unwrap();
        assert!(doc.release("2.1").is_some() || doc.release("2.10").is_some());
    }

    #[test]
    fn test_invalid_version_key_rejected() {
        let yaml = "releases:\n  not-a-version:\n    release_date: '2020-01-01'\n";
        let err = ChangesDocument::from_yaml(yaml.as_bytes(), &config()).unwrap_err();
        assert!(err.to_string().contains("not-a-version") || matches!(err, AntsibullError::Version { .. }));
    }

    #[test]
    fn test_format_mismatch_rejected() {
        let yaml = "releases:\n  1.0.0:\n    modules:\n      - just_a_name\n";
        let err = ChangesDocument::from_yaml(yaml.as_bytes(), &config()).unwrap_err();
        assert!(matches!(err, AntsibullError::Parse { .. }));

        let classic = config().with_format(ChangesFormat::Classic);
        let doc = ChangesDocument::from_yaml(yaml.as_bytes(), &classic).unwrap();
        assert_eq!(doc.release("1.0.0").unwrap().modules[0].name(), "just_a_name");
    }

    #[test]
    fn test_empty_yaml_is_empty_document() {
        let doc = ChangesDocument::from_value(serde_yaml::Value::Null, &config()).unwrap();
        assert!(!doc.has_release());
        assert_eq!(doc.latest_version().unwrap(), None);
    }

    #[test]
    fn test_prune_versions() {
        let mut doc = with_releases(&["1.0.0", "1.0.1", "1.1.0", "2.0.0"], None);
        doc.prune_versions(Some("1.0.0"), Some("1.1.0")).unwrap();
        let mut left: Vec<&String> = doc.releases().keys().collect();
        left.sort();
        assert_eq!(left, vec!["1.0.1", "1.1.0"]);

        doc.prune_versions(Some("1.0.0"), Some("1.1.0")).unwrap();
        assert_eq!(doc.releases().len(), 2, "pruning is idempotent");
    }

    #[test]
    fn test_prune_unbounded() {
        let mut doc = with_releases(&["1.0.0", "2.0.0"], None);
        doc.prune_versions(None, None).unwrap();
        assert_eq!(doc.releases().len(), 2);
        doc.prune_versions(None, Some("1.5.0")).unwrap();
        assert!(doc.release("1.0.0").is_some());
        assert!(doc.release("2.0.0").is_none());
    }

    #[test]
    fn test_concatenate_later_wins_and_min_ancestor() {
        let mut newer = with_releases(&["2.0.0", "2.1.0"], Some("1.5.0"));
        newer.release_mut("2.0.0").unwrap().codename = Some("new".into());
        let mut older = with_releases(&["1.5.0", "2.0.0"], Some("1.0.0"));
        older.release_mut("2.0.0").unwrap().codename = Some("old".into());
        let none = with_releases(&["0.9.0"], None);

        let merged = ChangesDocument::concatenate(vec![newer, older, none]).unwrap();
        assert_eq!(merged.ancestor(), Some("1.0.0"));
        assert_eq!(merged.releases().len(), 4);
        assert_eq!(
            merged.release("2.0.0").unwrap().codename.as_deref(),
            Some("old")
        );
    }

    #[test]
    fn test_concatenate_all_without_ancestor() {
        let merged = ChangesDocument::concatenate(vec![
            with_releases(&["1.0.0"], None),
            with_releases(&["1.1.0"], None),
        ])
        .unwrap();
        assert_eq!(merged.ancestor(), None);
    }

    #[test]
    #[should_panic(expected = "empty list")]
    fn test_concatenate_empty_panics() {
        let _ = ChangesDocument::concatenate(Vec::new());
    }

    #[test]
    fn test_sort_keeps_prelude_and_sorts_lists() {
        let mut doc = sample();
        doc.sort().unwrap();
        let versions: Vec<&String> = doc.releases().keys().collect();
        assert_eq!(versions, vec!["1.0.1", "1.1.0"]);

        let release = doc.release("1.1.0").unwrap();
        let names: Vec<&str> = release.modules.iter().map(PluginRef::name).collect();
        assert_eq!(names, vec!["amod", "zmod"]);
        assert_eq!(release.fragments, vec!["a.yml", "b.yml"]);
        let changes = release.changes.as_ref().unwrap();
        let keys: Vec<&String> = changes.keys().collect();
        assert_eq!(keys, vec!["minor_changes", "release_summary"]);
        assert_eq!(
            changes["minor_changes"],
            SectionContent::Items(vec!["alpha - added option.".into(), "zeta - added option.".into()])
        );
        assert_eq!(
            changes["release_summary"],
            SectionContent::Prose("Feature release.".into())
        );
    }

    #[test]
    fn test_yaml_is_stable() {
        let first = sample().to_yaml().unwrap();
        let reparsed = ChangesDocument::from_yaml(first.as_bytes(), &config()).unwrap();
        assert_eq!(first, reparsed.to_yaml().unwrap());
        assert!(first.starts_with("ancestor:"));
        assert!(first.contains("namespace: null"));
    }

    #[test]
    fn test_add_release_and_fragment() {
        let config = config();
        let mut doc = ChangesDocument::empty(&config);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(doc.add_release("1.2.0", date, None).unwrap());
        assert!(!doc.add_release("1.2.0", date, None).unwrap());
        assert_eq!(
            doc.release("1.2.0").unwrap().release_date.as_deref(),
            Some("2024-03-01")
        );

        let mut content = IndexMap::new();
        content.insert(
            "bugfixes".to_string(),
            SectionContent::Items(vec!["fix it.".into()]),
        );
        content.insert(
            "release_summary".to_string(),
            SectionContent::Prose("Summary.".into()),
        );
        let fragment = ChangelogFragment::new("fix.yml", content);
        assert!(doc.add_fragment(&fragment, "1.2.0", &config).unwrap());
        assert!(!doc.add_fragment(&fragment, "1.2.0", &config).unwrap());

        let mut second = IndexMap::new();
        second.insert(
            "release_summary".to_string(),
            SectionContent::Prose("Again.".into()),
        );
        let err = doc
            .add_fragment(&ChangelogFragment::new("again.yml", second), "1.2.0", &config)
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let mut unknown = IndexMap::new();
        unknown.insert("nonsense".to_string(), SectionContent::Items(vec![]));
        assert!(doc
            .add_fragment(&ChangelogFragment::new("x.yml", unknown), "1.2.0", &config)
            .is_err());

        match doc.add_fragment(&fragment, "9.9.9", &config) {
            Err(AntsibullError::Validation(msg)) => {
                assert_eq!(msg, "release 9.9.9 does not exist");
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_add_plugin_dedups_across_releases() {
        let mut doc = with_releases(&["1.0.0", "1.1.0"], None);
        let plugin = PluginDescription::new("foo", "Foo lookup");
        assert!(doc.add_plugin("lookup", plugin.clone(), "1.0.0").unwrap());
        assert!(!doc.add_plugin("lookup", plugin.clone(), "1.1.0").unwrap());
        assert!(doc.add_plugin("module", plugin, "1.1.0").unwrap());
        assert_eq!(doc.release("1.1.0").unwrap().modules.len(), 1);
    }
}
