//! Per-changelog configuration.

use crate::version::VersionScheme;
use serde::{Deserialize, Serialize};

/// Name of the prelude section in every changelog.
pub const DEFAULT_PRELUDE_NAME: &str = "release_summary";

/// Title of the prelude section.
pub const DEFAULT_PRELUDE_TITLE: &str = "Release Summary";

/// Default change sections, in rendering order (prelude excluded).
pub const DEFAULT_SECTIONS: &[(&str, &str)] = &[
    ("major_changes", "Major Changes"),
    ("minor_changes", "Minor Changes"),
    ("breaking_changes", "Breaking Changes / Porting Guide"),
    ("deprecated_features", "Deprecated Features"),
    ("removed_features", "Removed Features (previously deprecated)"),
    ("security_fixes", "Security Fixes"),
    ("bugfixes", "Bugfixes"),
    ("known_issues", "Known Issues"),
];

/// How a changelog document stores its release data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangesFormat {
    /// Full plugin descriptions and merged `changes` inline
    #[default]
    Combined,
    /// Plugin and fragment names only, resolved against external databases
    Classic,
}

/// Configuration of a single changelog (collection, ansible-core, or Ansible).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogConfig {
    /// Version grammar of the document
    pub scheme: VersionScheme,
    /// Project title used in standalone changelogs
    pub title: Option<String>,
    /// Prelude section name
    pub prelude_name: String,
    /// Prelude section title
    pub prelude_title: String,
    /// Ordered `(name, title)` pairs, prelude excluded
    pub sections: Vec<(String, String)>,
    /// Whether module names are rendered without their namespace
    pub flatmap: bool,
    /// Storage format
    pub format: ChangesFormat,
    /// Whether standalone changelogs mention the ancestor version
    pub mention_ancestor: bool,
}

impl ChangelogConfig {
    fn with_scheme(scheme: VersionScheme, flatmap: bool) -> Self {
        Self {
            scheme,
            title: None,
            prelude_name: DEFAULT_PRELUDE_NAME.to_string(),
            prelude_title: DEFAULT_PRELUDE_TITLE.to_string(),
            sections: DEFAULT_SECTIONS
                .iter()
                .map(|(name, title)| ((*name).to_string(), (*title).to_string()))
                .collect(),
            flatmap,
            format: ChangesFormat::Combined,
            mention_ancestor: true,
        }
    }

    /// Configuration for a collection's changelog.
    #[must_use]
    pub fn collection(name: &str) -> Self {
        let mut config = Self::with_scheme(VersionScheme::Semantic, true);
        config.title = Some(name.to_string());
        config
    }

    /// Configuration for ansible-core's changelog.
    #[must_use]
    pub fn ansible_core() -> Self {
        let mut config = Self::with_scheme(VersionScheme::Core, false);
        config.title = Some("Ansible Core".to_string());
        config
    }

    /// Configuration for the Ansible package's own changelog.
    #[must_use]
    pub fn ansible() -> Self {
        let mut config = Self::with_scheme(VersionScheme::Core, true);
        config.title = Some("Ansible".to_string());
        config
    }

    #[must_use]
    pub fn with_format(mut self, format: ChangesFormat) -> Self {
        self.format = format;
        self
    }

    /// Whether `name` is the prelude section.
    #[must_use]
    pub fn is_prelude(&self, name: &str) -> bool {
        self.prelude_name == name
    }

    /// Whether `name` is a known section (prelude included).
    #[must_use]
    pub fn is_known_section(&self, name: &str) -> bool {
        self.is_prelude(name) || self.sections.iter().any(|(n, _)| n == name)
    }

    /// Title for a section name, falling back to a title-cased name.
    #[must_use]
    pub fn section_title(&self, name: &str) -> String {
        if self.is_prelude(name) {
            return self.prelude_title.clone();
        }
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map_or_else(|| title_case(&name.replace('_', " ")), |(_, t)| t.clone())
    }

    /// All `(name, title)` pairs in rendering order, prelude first.
    pub fn all_sections(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((self.prelude_name.as_str(), self.prelude_title.as_str())).chain(
            self.sections
                .iter()
                .map(|(name, title)| (name.as_str(), title.as_str())),
        )
    }
}

/// Capitalize the first letter of every word and lowercase the rest.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_order() {
        let config = ChangelogConfig::collection("community.general");
        let names: Vec<&str> = config.all_sections().map(|(n, _)| n).collect();
        assert_eq!(names.first(), Some(&"release_summary"));
        assert_eq!(names.last(), Some(&"known_issues"));
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_section_title() {
        let config = ChangelogConfig::ansible();
        assert_eq!(
            config.section_title("breaking_changes"),
            "Breaking Changes / Porting Guide"
        );
        assert_eq!(config.section_title("release_summary"), "Release Summary");
        assert_eq!(config.section_title("trivial_stuff"), "Trivial Stuff");
    }

    #[test]
    fn test_schemes_and_flatmap() {
        assert_eq!(
            ChangelogConfig::collection("a.b").scheme,
            VersionScheme::Semantic
        );
        assert!(!ChangelogConfig::ansible_core().flatmap);
        assert_eq!(ChangelogConfig::ansible().scheme, VersionScheme::Core);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("known issues"), "Known Issues");
        assert_eq!(title_case("NET_TOOLS"), "Net_Tools");
        assert_eq!(title_case("become"), "Become");
    }
}
