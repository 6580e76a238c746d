//! Per-collection metadata from `collection-meta.yaml`.

use crate::error::{AntsibullError, ErrorContext, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// File name of the metadata file inside a build data directory.
pub const COLLECTION_META_FILE: &str = "collection-meta.yaml";

/// Metadata about one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CollectionMetadata {
    /// Where humans can read the collection's changelog
    #[serde(default, rename = "changelog-url")]
    pub changelog_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CollectionMetaFile {
    #[serde(default)]
    collections: Option<IndexMap<String, Option<CollectionMetadata>>>,
}

/// Metadata for a set of collections.
#[derive(Debug, Clone, Default)]
pub struct CollectionsMetadata {
    data: IndexMap<String, CollectionMetadata>,
}

impl CollectionsMetadata {
    /// Parse `collection-meta.yaml` content.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let file: Option<CollectionMetaFile> =
            serde_yaml::from_slice(bytes).context(COLLECTION_META_FILE)?;
        let data = file
            .and_then(|file| file.collections)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, meta)| (name, meta.unwrap_or_default()))
            .collect();
        Ok(Self { data })
    }

    /// Load `<dir>/collection-meta.yaml`; a missing directory or file
    /// yields empty metadata.
    pub fn load(deps_dir: Option<&Path>) -> Result<Self> {
        let Some(dir) = deps_dir else {
            return Ok(Self::default());
        };
        let path = dir.join(COLLECTION_META_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(&path).map_err(|e| AntsibullError::io(&path, e))?;
        Self::from_yaml(&bytes)
    }

    pub fn insert(&mut self, name: impl Into<String>, meta: CollectionMetadata) {
        self.data.insert(name.into(), meta);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionMetadata> {
        self.data.get(name)
    }

    /// Changelog URL of a collection, if known.
    #[must_use]
    pub fn changelog_url(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|meta| meta.changelog_url.as_deref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_meta() {
        let yaml = br#"
collections:
  community.general:
    changelog-url: https://github.com/ansible-collections/community.general/blob/main/CHANGELOG.rst
    maintainers:
      - someone
  community.empty:
"#;
        let meta = CollectionsMetadata::from_yaml(yaml).unwrap();
        assert_eq!(meta.len(), 2);
        assert!(meta
            .changelog_url("community.general")
            .unwrap()
            .ends_with("CHANGELOG.rst"));
        assert_eq!(meta.changelog_url("community.empty"), None);
        assert_eq!(meta.changelog_url("unknown.name"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CollectionsMetadata::load(Some(dir.path())).unwrap().is_empty());
        assert!(CollectionsMetadata::load(None).unwrap().is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(CollectionsMetadata::from_yaml(b"").unwrap().is_empty());
    }
}
