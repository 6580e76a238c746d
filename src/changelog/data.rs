//! A changelog bundled with its configuration.

use super::config::ChangelogConfig;
use super::document::{ChangesDocument, SectionContent};
use super::generator::{ChangelogGenerator, ReleaseEntry};
use super::resolver::ChangesResolver;
use crate::error::Result;
use std::path::Path;

/// Data for a single changelog: a collection's, ansible-core's, or the
/// Ansible package's own.
#[derive(Debug, Clone)]
pub struct ChangelogData {
    config: ChangelogConfig,
    document: ChangesDocument,
    resolver: ChangesResolver,
}

impl ChangelogData {
    pub fn new(config: ChangelogConfig, document: ChangesDocument) -> Self {
        Self {
            config,
            document,
            resolver: ChangesResolver::Combined,
        }
    }

    /// Attach the databases needed to resolve a classic document.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ChangesResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// A collection changelog parsed from `changelog.yaml` bytes.
    pub fn collection(name: &str, bytes: &[u8]) -> Result<Self> {
        let config = ChangelogConfig::collection(name);
        let document = ChangesDocument::from_yaml(bytes, &config)?;
        Ok(Self::new(config, document))
    }

    /// The ansible-core changelog parsed from `changelog.yaml` bytes.
    pub fn ansible_core(bytes: &[u8]) -> Result<Self> {
        let config = ChangelogConfig::ansible_core();
        let document = ChangesDocument::from_yaml(bytes, &config)?;
        Ok(Self::new(config, document))
    }

    /// The Ansible package changelog from `<dir>/changelog.yaml`, or an
    /// empty one when no directory is given or the file does not exist.
    pub fn ansible(directory: Option<&Path>) -> Result<Self> {
        let config = ChangelogConfig::ansible();
        let document = match directory {
            Some(dir) => ChangesDocument::load(&dir.join("changelog.yaml"), &config)?,
            None => ChangesDocument::empty(&config),
        };
        Ok(Self::new(config, document))
    }

    /// Merge changelogs; see [`ChangesDocument::concatenate`].
    ///
    /// # Panics
    ///
    /// Panics when `changelogs` is empty.
    pub fn concatenate(changelogs: Vec<ChangelogData>) -> Result<Self> {
        assert!(
            !changelogs.is_empty(),
            "cannot concatenate an empty list of changelogs"
        );
        let mut changelogs = changelogs.into_iter();
        let Some(first) = changelogs.next() else {
            unreachable!()
        };
        let documents = std::iter::once(first.document)
            .chain(changelogs.map(|changelog| changelog.document))
            .collect();
        let document = ChangesDocument::concatenate(documents)?;
        Ok(Self {
            config: first.config,
            document,
            resolver: first.resolver,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ChangelogConfig {
        &self.config
    }

    #[must_use]
    pub fn document(&self) -> &ChangesDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut ChangesDocument {
        &mut self.document
    }

    #[must_use]
    pub fn generator(&self) -> ChangelogGenerator<'_> {
        ChangelogGenerator::new(&self.config, &self.document, &self.resolver)
    }

    /// Shorthand for `generator().collect(...)`.
    pub fn collect(
        &self,
        squash: bool,
        after: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<ReleaseEntry>> {
        self.generator().collect(squash, after, until)
    }

    /// Add (or update) an Ansible release with its release summary.
    pub fn add_ansible_release(
        &mut self,
        version: &str,
        date: chrono::NaiveDate,
        release_summary: &str,
    ) -> Result<()> {
        if self.document.release(version).is_none() {
            self.document.add_release(version, date, None)?;
        }
        if let Some(release) = self.document.release_mut(version) {
            release.changes.get_or_insert_with(Default::default).insert(
                self.config.prelude_name.clone(),
                SectionContent::Prose(release_summary.to_string()),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_ansible_release_overwrites_summary() {
        let mut data = ChangelogData::ansible(None).unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        data.add_ansible_release("9.1.0", date, "First.").unwrap();
        data.add_ansible_release("9.1.0", date, "Second.").unwrap();

        let release = data.document().release("9.1.0").unwrap();
        assert_eq!(release.release_date.as_deref(), Some("2024-01-02"));
        assert_eq!(
            release.changes.as_ref().unwrap()["release_summary"],
            SectionContent::Prose("Second.".into())
        );
    }

    #[test]
    fn test_concatenate_keeps_first_config() {
        let a = ChangelogData::collection("a.b", b"releases:\n  1.1.0: {}\nancestor: 1.0.0\n").unwrap();
        let b = ChangelogData::collection("a.b", b"releases:\n  1.0.0: {}\n").unwrap();
        let merged = ChangelogData::concatenate(vec![a, b]).unwrap();
        assert_eq!(merged.config().title.as_deref(), Some("a.b"));
        assert_eq!(merged.document().releases().len(), 2);
        assert_eq!(merged.document().ancestor(), Some("1.0.0"));
    }

    #[test]
    fn test_missing_ansible_changelog_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let data = ChangelogData::ansible(Some(dir.path())).unwrap();
        assert!(!data.document().has_release());
    }
}
