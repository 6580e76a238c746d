//! Slicing a changelog document into release entries.

use super::config::ChangelogConfig;
use super::document::{ChangesDocument, PluginDescription, ReleaseChanges, SectionContent};
use super::resolver::ChangesResolver;
use crate::error::Result;
use indexmap::IndexMap;

/// Accumulated changes for one version, or for a squashed version range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// Version the entry is reported under
    pub version: String,
    pub modules: Vec<PluginDescription>,
    pub plugins: IndexMap<String, Vec<PluginDescription>>,
    pub objects: IndexMap<String, Vec<PluginDescription>>,
    pub changes: ReleaseChanges,
}

impl ReleaseEntry {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// True when none of `sections` (all sections if `None`) has content.
    #[must_use]
    pub fn has_no_changes(&self, sections: Option<&[&str]>) -> bool {
        match sections {
            None => self.changes.values().all(SectionContent::is_empty),
            Some(names) => names.iter().all(|name| {
                self.changes
                    .get(*name)
                    .map_or(true, SectionContent::is_empty)
            }),
        }
    }

    /// True when the entry has no changes and introduces nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.has_no_changes(None)
            && self.modules.is_empty()
            && self.plugins.values().all(Vec::is_empty)
            && self.objects.values().all(Vec::is_empty)
    }
}

fn extend_section(dest: &mut SectionContent, content: &SectionContent) {
    let incoming = content.items().into_iter().map(str::to_string);
    match dest {
        SectionContent::Items(items) => items.extend(incoming),
        SectionContent::Prose(text) => {
            let mut items = vec![std::mem::take(text)];
            items.extend(incoming);
            *dest = SectionContent::Items(items);
        }
    }
}

/// Collects release entries from one changelog document.
#[derive(Debug, Clone, Copy)]
pub struct ChangelogGenerator<'a> {
    config: &'a ChangelogConfig,
    document: &'a ChangesDocument,
    resolver: &'a ChangesResolver,
}

impl<'a> ChangelogGenerator<'a> {
    pub fn new(
        config: &'a ChangelogConfig,
        document: &'a ChangesDocument,
        resolver: &'a ChangesResolver,
    ) -> Self {
        Self {
            config,
            document,
            resolver,
        }
    }

    /// Collect release entries for versions in `(after, until]`, newest first.
    ///
    /// With `squash`, everything lands in a single entry reported under
    /// `until` (or the latest version). Otherwise every release version
    /// gets its own entry and pre-releases are folded into the release
    /// that follows them. Only the newest prelude of an entry is kept.
    pub fn collect(
        &self,
        squash: bool,
        after: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<ReleaseEntry>> {
        let scheme = self.config.scheme;
        let after_version = after.map(|v| scheme.parse(v)).transpose()?;
        let until_version = until.map(|v| scheme.parse(v)).transpose()?;

        let versions: Vec<_> = self
            .document
            .versions_descending()?
            .into_iter()
            .filter(|(version, _)| version.in_range(after_version.as_ref(), until_version.as_ref()))
            .collect();

        let mut entry_version = match until {
            Some(until) => until.to_string(),
            None => match self.document.latest_version()? {
                Some(latest) => latest,
                None => return Ok(Vec::new()),
            },
        };
        let mut entry_is_release = scheme.is_release(&entry_version)?;
        let mut entry_prelude: Option<String> = None;
        let mut entries: IndexMap<String, ReleaseEntry> = IndexMap::new();

        for (parsed, version) in versions {
            let Some(release) = self.document.release(&version) else {
                continue;
            };

            if !squash && (!parsed.is_prerelease() || !entry_is_release) {
                entry_version = version.clone();
                entry_is_release = !parsed.is_prerelease();
                entry_prelude = None;
            }

            let entry = entries
                .entry(entry_version.clone())
                .or_insert_with(|| ReleaseEntry::new(entry_version.clone()));

            for fragment in self.resolver.resolve_fragments(release) {
                for (section, content) in fragment {
                    if self.config.is_prelude(&section) {
                        if let Some(newer) = &entry_prelude {
                            tracing::info!(
                                "Skipping prelude in version {version} due to newer prelude in version {newer}"
                            );
                            continue;
                        }
                        entry_prelude = Some(version.clone());
                        entry.changes.insert(section, content);
                        continue;
                    }
                    match entry.changes.get_mut(&section) {
                        Some(dest) => extend_section(dest, &content),
                        None => {
                            let items = content.items().into_iter().map(str::to_string).collect();
                            entry.changes.insert(section, SectionContent::Items(items));
                        }
                    }
                }
            }

            let resolved = self.resolver.resolve_plugins(release);
            entry.modules.extend(resolved.modules);
            for (kind, plugins) in resolved.plugins {
                entry.plugins.entry(kind).or_default().extend(plugins);
            }
            for (kind, objects) in resolved.objects {
                entry.objects.entry(kind).or_default().extend(objects);
            }
        }

        Ok(entries.into_values().collect())
    }
}
