//! In-memory changelog source.

use super::ChangelogSource;
use crate::error::Result;
use crate::version::PypiVersion;
use std::collections::HashMap;
use std::sync::Mutex;

/// [`ChangelogSource`] backed by maps, for embedding and tests.
///
/// Every lookup is recorded so callers can inspect which documents a
/// collector asked for.
#[derive(Debug, Default)]
pub struct MemorySource {
    collections: HashMap<(String, String), Vec<u8>>,
    core: HashMap<String, Vec<u8>>,
    porting_guides: HashMap<(u64, u64), Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_collection(mut self, name: &str, version: &str, changelog: impl Into<Vec<u8>>) -> Self {
        self.collections
            .insert((name.to_string(), version.to_string()), changelog.into());
        self
    }

    #[must_use]
    pub fn with_core(mut self, version: &str, changelog: impl Into<Vec<u8>>) -> Self {
        self.core.insert(version.to_string(), changelog.into());
        self
    }

    /// Register the porting guide of a core `major.minor` series.
    #[must_use]
    pub fn with_porting_guide(mut self, major: u64, minor: u64, text: impl Into<Vec<u8>>) -> Self {
        self.porting_guides.insert((major, minor), text.into());
        self
    }

    /// Lookups performed so far, as `name@version`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: String) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

impl ChangelogSource for MemorySource {
    fn collection_changelog(
        &self,
        collection: &str,
        version: &semver::Version,
    ) -> Result<Option<Vec<u8>>> {
        let version = version.to_string();
        self.record(format!("{collection}@{version}"));
        Ok(self
            .collections
            .get(&(collection.to_string(), version))
            .cloned())
    }

    fn core_changelog(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        let version = version.to_string();
        self.record(format!("ansible-core@{version}"));
        Ok(self.core.get(&version).cloned())
    }

    fn core_porting_guide(&self, version: &PypiVersion) -> Result<Option<Vec<u8>>> {
        Ok(self.porting_guides.get(&version.major_minor()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_are_recorded() {
        let source = MemorySource::new().with_collection("a.b", "1.0.0", "releases: {}\n");
        let found = source
            .collection_changelog("a.b", &semver::Version::new(1, 0, 0))
            .unwrap();
        assert!(found.is_some());
        let missing = source
            .collection_changelog("a.b", &semver::Version::new(0, 9, 0))
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(source.requests(), vec!["a.b@1.0.0", "a.b@0.9.0"]);
    }
}
