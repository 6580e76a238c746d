//! Changelog documents and everything needed to interpret them.
//!
//! - [`config`]: section tables, prelude and scheme per changelog kind
//! - [`document`]: the `changelog.yaml` model with pruning and concatenation
//! - [`resolver`]: classic/combined storage formats
//! - [`generator`]: slicing a document into release entries
//! - [`data`]: a document bound to its configuration
//! - [`lint`]: structural checks on raw `changelog.yaml` files

pub mod config;
pub mod data;
pub mod document;
pub mod generator;
pub mod lint;
pub mod resolver;

pub use config::{title_case, ChangelogConfig, ChangesFormat, DEFAULT_SECTIONS};
pub use data::ChangelogData;
pub use document::{
    ChangesDocument, PluginDescription, PluginRef, ReleaseChanges, ReleaseRecord, SectionContent,
};
pub use generator::{ChangelogGenerator, ReleaseEntry};
pub use lint::{lint_changelog_yaml, ChangelogYamlLinter, LintViolation};
pub use resolver::{
    ChangelogFragment, ChangesResolver, ClassicSources, FragmentDatabase, PluginDatabase,
};
