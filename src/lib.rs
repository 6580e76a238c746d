//! **Changelog aggregation for Ansible releases.**
//!
//! An Ansible release bundles ansible-core with a set of independently
//! versioned collections. `antsibull` collects the changelog of every one
//! of them, walks each changelog's ancestor chain back far enough to cover
//! the whole major release, and merges the results into a single set of
//! release notes and a porting guide.
//!
//! ## Core Concepts & Modules
//!
//! - **[`version`]**: PEP 440 versions ([`PypiVersion`]) and the
//!   per-changelog version scheme.
//! - **[`changelog`]**: the `changelog.yaml` document model, pruning and
//!   concatenation, and slicing into [`ReleaseEntry`] values.
//! - **[`deps`]**: `.deps` manifests listing the contents of every Ansible
//!   release, and collection metadata.
//! - **[`fetch`]**: the [`ChangelogSource`] trait and its implementations
//!   (local tree, Galaxy/PyPI behind the `network` feature).
//! - **[`collector`]**: parallel download and ancestor-chain resolution.
//! - **[`aggregate`]**: classification of every release against its
//!   predecessor, producing a [`Changelog`].
//! - **[`render`]**: document composition and RST/Markdown output.
//!
//! ## Getting Started
//!
//! ```no_run
//! use antsibull::{get_changelog, ChangelogInputs, DirectorySource, PypiVersion, ReleaseNotes};
//! use antsibull::render::DocumentFormat;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let version = PypiVersion::parse("9.1.0")?;
//!     let inputs = ChangelogInputs::from_deps_dir(version, Path::new("ansible-build-data/9"))?;
//!     let source = DirectorySource::new("mirror");
//!     let changelog = get_changelog(inputs, &source, 4)?;
//!
//!     let notes = ReleaseNotes::build(
//!         &changelog,
//!         &[DocumentFormat::Rst, DocumentFormat::Markdown],
//!         "https://github.com/ansible-community/ansible-build-data/blob/main",
//!     )?;
//!     notes.write_changelog_to(Path::new("out"))?;
//!     notes.write_porting_guide_to(Path::new("out"))?;
//!     print!("{}", changelog.missing_changelogs());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `network` (default): Galaxy and PyPI downloads. This adds `reqwest`,
//!   `sha2`, `flate2`, `tar` and `rand`.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Composition functions mirror the document structure they build
    clippy::too_many_lines,
    clippy::similar_names
)]

pub mod aggregate;
pub mod changelog;
pub mod cli;
pub mod collector;
pub mod config;
pub mod deps;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod render;
pub mod version;

// Re-export main types for convenience
pub use aggregate::{
    get_changelog, Changelog, ChangelogEntry, ChangelogInputs, CollectionChange,
    MissingChangelogReport,
};
pub use changelog::{ChangelogConfig, ChangelogData, ChangesDocument, ReleaseEntry};
pub use collector::{
    collect_changelogs, CollectionChangelogCollector, CollectorState, CoreChangelogCollector,
};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use deps::{CollectionsMetadata, DependencyFileData};
pub use error::{AntsibullError, ErrorContext, OptionContext, Result};
pub use fetch::{ChangelogSource, DirectorySource, MemorySource};
pub use render::{DocumentFormat, ReleaseNotes};
pub use version::{PypiVersion, SchemeVersion, VersionScheme};
