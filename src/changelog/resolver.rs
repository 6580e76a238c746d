//! Resolution of release records into plugin descriptions and change fragments.
//!
//! Combined documents carry everything inline. Classic documents store only
//! names, which are looked up in a plugin database (the `.plugin-cache.yaml`
//! of a collection) and a fragment database (the `changelogs/fragments/`
//! directory).

use super::document::{PluginDescription, PluginRef, ReleaseChanges, ReleaseRecord};
use crate::error::{AntsibullError, ErrorContext, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// A named changelog fragment: section name to content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogFragment {
    pub name: String,
    pub content: ReleaseChanges,
}

impl ChangelogFragment {
    pub fn new(name: impl Into<String>, content: ReleaseChanges) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Parse a fragment file.
    pub fn from_yaml(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let content: Option<ReleaseChanges> =
            serde_yaml::from_slice(bytes).with_context(|| format!("fragment {name}"))?;
        Ok(Self::new(name, content.unwrap_or_default()))
    }

    /// Load every `*.yml` / `*.yaml` fragment in `dir`, sorted by file name.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>> {
        let entries = std::fs::read_dir(dir).map_err(|e| AntsibullError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| AntsibullError::io(dir, e))?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if is_yaml && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let bytes = std::fs::read(&path).map_err(|e| AntsibullError::io(&path, e))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Self::from_yaml(name, &bytes)
            })
            .collect()
    }
}

/// Fragments by file name.
#[derive(Debug, Clone, Default)]
pub struct FragmentDatabase {
    fragments: HashMap<String, ChangelogFragment>,
}

impl FragmentDatabase {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ChangelogFragment> {
        self.fragments.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl FromIterator<ChangelogFragment> for FragmentDatabase {
    fn from_iter<I: IntoIterator<Item = ChangelogFragment>>(iter: I) -> Self {
        Self {
            fragments: iter
                .into_iter()
                .map(|fragment| (fragment.name.clone(), fragment))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PluginCacheEntry {
    #[serde(default)]
    description: Option<String>,
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PluginCacheFile {
    #[serde(default)]
    plugins: IndexMap<String, Option<IndexMap<String, PluginCacheEntry>>>,
    #[serde(default)]
    objects: IndexMap<String, Option<IndexMap<String, PluginCacheEntry>>>,
}

/// Plugin and object descriptions by type and name.
#[derive(Debug, Clone, Default)]
pub struct PluginDatabase {
    plugins: HashMap<String, HashMap<String, PluginDescription>>,
    objects: HashMap<String, HashMap<String, PluginDescription>>,
}

impl PluginDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin; modules use the type `module`.
    pub fn insert(&mut self, plugin_type: &str, plugin: PluginDescription) {
        self.plugins
            .entry(plugin_type.to_string())
            .or_default()
            .insert(plugin.name.clone(), plugin);
    }

    pub fn insert_object(&mut self, object_type: &str, object: PluginDescription) {
        self.objects
            .entry(object_type.to_string())
            .or_default()
            .insert(object.name.clone(), object);
    }

    /// Parse a collection's `.plugin-cache.yaml`.
    pub fn from_plugin_cache_yaml(bytes: &[u8]) -> Result<Self> {
        let file: PluginCacheFile = serde_yaml::from_slice(bytes).context("plugin cache")?;
        let mut db = Self::new();
        for (plugin_type, entries) in file.plugins {
            for entry in entries.unwrap_or_default().into_values() {
                db.insert(&plugin_type, entry.into());
            }
        }
        for (object_type, entries) in file.objects {
            for entry in entries.unwrap_or_default().into_values() {
                db.insert_object(&object_type, entry.into());
            }
        }
        Ok(db)
    }

    fn lookup(
        table: &HashMap<String, HashMap<String, PluginDescription>>,
        kind: &str,
        name: &str,
    ) -> PluginDescription {
        match table.get(kind).and_then(|by_name| by_name.get(name)) {
            Some(plugin) => plugin.clone(),
            None => {
                tracing::warn!("No description known for {kind} {name}");
                PluginDescription {
                    description: None,
                    name: name.to_string(),
                    namespace: None,
                }
            }
        }
    }
}

impl From<PluginCacheEntry> for PluginDescription {
    fn from(entry: PluginCacheEntry) -> Self {
        Self {
            description: entry.description,
            name: entry.name,
            namespace: entry.namespace,
        }
    }
}

/// Plugins, modules and objects introduced by a release, fully described.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPlugins {
    pub modules: Vec<PluginDescription>,
    pub plugins: IndexMap<String, Vec<PluginDescription>>,
    pub objects: IndexMap<String, Vec<PluginDescription>>,
}

/// Databases backing a classic document.
#[derive(Debug, Clone, Default)]
pub struct ClassicSources {
    pub plugins: PluginDatabase,
    pub fragments: FragmentDatabase,
}

/// The closed set of storage formats and how each resolves release data.
#[derive(Debug, Clone, Default)]
pub enum ChangesResolver {
    #[default]
    Combined,
    Classic(ClassicSources),
}

impl ChangesResolver {
    /// Plugin descriptions introduced by `release`.
    #[must_use]
    pub fn resolve_plugins(&self, release: &ReleaseRecord) -> ResolvedPlugins {
        let describe = |table: Option<&HashMap<String, HashMap<String, PluginDescription>>>,
                        kind: &str,
                        entry: &PluginRef| {
            match (entry, table) {
                (PluginRef::Described(plugin), _) => plugin.clone(),
                (PluginRef::Named(name), Some(table)) => PluginDatabase::lookup(table, kind, name),
                (PluginRef::Named(name), None) => PluginDescription {
                    description: None,
                    name: name.clone(),
                    namespace: None,
                },
            }
        };
        let (plugin_table, object_table) = match self {
            Self::Combined => (None, None),
            Self::Classic(sources) => (Some(&sources.plugins.plugins), Some(&sources.plugins.objects)),
        };

        ResolvedPlugins {
            modules: release
                .modules
                .iter()
                .map(|entry| describe(plugin_table, "module", entry))
                .collect(),
            plugins: release
                .plugins
                .iter()
                .map(|(kind, entries)| {
                    let resolved = entries
                        .iter()
                        .map(|entry| describe(plugin_table, kind, entry))
                        .collect();
                    (kind.clone(), resolved)
                })
                .collect(),
            objects: release
                .objects
                .iter()
                .map(|(kind, entries)| {
                    let resolved = entries
                        .iter()
                        .map(|entry| describe(object_table, kind, entry))
                        .collect();
                    (kind.clone(), resolved)
                })
                .collect(),
        }
    }

    /// Change fragments of `release`, in recorded order.
    #[must_use]
    pub fn resolve_fragments(&self, release: &ReleaseRecord) -> Vec<ReleaseChanges> {
        match self {
            Self::Combined => release.changes.iter().cloned().collect(),
            Self::Classic(sources) => release
                .fragments
                .iter()
                .filter_map(|name| match sources.fragments.get(name) {
                    Some(fragment) => Some(fragment.content.clone()),
                    None => {
                        tracing::warn!("Fragment {name} is referenced but could not be found");
                        None
                    }
                })
                .collect(),
        }
    }
}
