//! Collecting the changelog history of every dependency of a release train.
//!
//! Each dependency gets one collector holding the versions it must
//! explain. [`collect_changelogs`] downloads all of them on a bounded
//! worker pool and returns once every collector is ready.

mod history;

pub use history::HistoryResolver;

use crate::changelog::ChangelogData;
use crate::error::{AntsibullError, Result};
use crate::fetch::ChangelogSource;
use crate::version::{PypiVersion, SchemeVersion};
use rayon::prelude::*;

/// Lifecycle of a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Created,
    Downloading,
    /// Changelog data is available
    Ready,
    /// Nothing usable was found; this is not an error
    ReadyEmpty,
}

impl CollectorState {
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready | Self::ReadyEmpty)
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Changelog history of one collection.
#[derive(Debug, Clone)]
pub struct CollectionChangelogCollector {
    collection: String,
    versions: Vec<semver::Version>,
    state: CollectorState,
    changelog: Option<ChangelogData>,
}

impl CollectionChangelogCollector {
    /// Create a collector for `collection` that must explain `versions`.
    pub fn new(
        collection: impl Into<String>,
        versions: impl IntoIterator<Item = semver::Version>,
    ) -> Result<Self> {
        let collection = collection.into();
        let mut versions: Vec<semver::Version> = versions.into_iter().collect();
        versions.sort();
        versions.dedup();
        if versions.is_empty() {
            return Err(AntsibullError::validation(format!(
                "collector for {collection} needs at least one version"
            )));
        }
        Ok(Self {
            collection,
            versions,
            state: CollectorState::Created,
            changelog: None,
        })
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Required versions, oldest first.
    #[must_use]
    pub fn versions(&self) -> &[semver::Version] {
        &self.versions
    }

    #[must_use]
    pub fn earliest(&self) -> &semver::Version {
        &self.versions[0]
    }

    #[must_use]
    pub fn latest(&self) -> &semver::Version {
        &self.versions[self.versions.len() - 1]
    }

    #[must_use]
    pub fn state(&self) -> CollectorState {
        self.state
    }

    #[must_use]
    pub fn changelog(&self) -> Option<&ChangelogData> {
        self.changelog.as_ref()
    }

    /// Fetch and merge the history needed for all required versions.
    pub fn download(&mut self, source: &dyn ChangelogSource) {
        self.state = CollectorState::Downloading;
        let earliest = SchemeVersion::Semantic(self.earliest().clone());
        let targets: Vec<SchemeVersion> = self
            .versions
            .iter()
            .cloned()
            .map(SchemeVersion::Semantic)
            .collect();

        let collection = self.collection.as_str();
        let resolver = HistoryResolver::new(collection, &earliest, |version| match version {
            SchemeVersion::Semantic(version) => source
                .collection_changelog(collection, version)?
                .map(|bytes| ChangelogData::collection(collection, &bytes))
                .transpose(),
            SchemeVersion::Core(version) => Err(AntsibullError::malformed_version(
                version.to_string(),
                "semantic",
            )),
        });
        self.changelog = resolver.resolve(&targets);

        self.state = if self.changelog.is_some() {
            CollectorState::Ready
        } else {
            tracing::info!("No changelog data for {}", self.collection);
            CollectorState::ReadyEmpty
        };
    }
}

// ============================================================================
// ansible-core
// ============================================================================

/// Changelog history and porting guide of ansible-core.
#[derive(Debug, Clone)]
pub struct CoreChangelogCollector {
    versions: Vec<PypiVersion>,
    state: CollectorState,
    changelog: Option<ChangelogData>,
    porting_guide: Option<String>,
}

impl CoreChangelogCollector {
    pub fn new(versions: impl IntoIterator<Item = PypiVersion>) -> Result<Self> {
        let mut versions: Vec<PypiVersion> = versions.into_iter().collect();
        versions.sort();
        versions.dedup();
        if versions.is_empty() {
            return Err(AntsibullError::validation(
                "ansible-core collector needs at least one version",
            ));
        }
        Ok(Self {
            versions,
            state: CollectorState::Created,
            changelog: None,
            porting_guide: None,
        })
    }

    #[must_use]
    pub fn versions(&self) -> &[PypiVersion] {
        &self.versions
    }

    #[must_use]
    pub fn earliest(&self) -> &PypiVersion {
        &self.versions[0]
    }

    #[must_use]
    pub fn latest(&self) -> &PypiVersion {
        &self.versions[self.versions.len() - 1]
    }

    #[must_use]
    pub fn state(&self) -> CollectorState {
        self.state
    }

    #[must_use]
    pub fn changelog(&self) -> Option<&ChangelogData> {
        self.changelog.as_ref()
    }

    /// Porting guide of the latest required core series.
    #[must_use]
    pub fn porting_guide(&self) -> Option<&str> {
        self.porting_guide.as_deref()
    }

    /// Fetch the changelog of the latest version and follow its ancestors,
    /// then fetch the porting guide.
    pub fn download(&mut self, source: &dyn ChangelogSource) {
        self.state = CollectorState::Downloading;
        let earliest = SchemeVersion::Core(self.earliest().clone());
        let latest = SchemeVersion::Core(self.latest().clone());

        let resolver = HistoryResolver::new("ansible-core", &earliest, |version| match version {
            SchemeVersion::Core(version) => source
                .core_changelog(version)?
                .map(|bytes| ChangelogData::ansible_core(&bytes))
                .transpose(),
            SchemeVersion::Semantic(version) => Err(AntsibullError::malformed_version(
                version.to_string(),
                "PEP 440",
            )),
        });
        self.changelog = resolver.walk(&latest);

        self.porting_guide = match source.core_porting_guide(self.latest()) {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("ansible-core porting guide is not UTF-8: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cannot download ansible-core porting guide: {e}");
                None
            }
        };

        self.state = if self.changelog.is_some() {
            CollectorState::Ready
        } else {
            tracing::info!("No changelog data for ansible-core");
            CollectorState::ReadyEmpty
        };
    }
}

// ============================================================================
// Worker pool
// ============================================================================

/// Download every collector on a pool of at most `thread_max` threads.
///
/// Collectors are independent; a failure in one only leaves that one
/// empty. Returns after all collectors are ready.
pub fn collect_changelogs(
    collectors: &mut [CollectionChangelogCollector],
    core: &mut CoreChangelogCollector,
    source: &dyn ChangelogSource,
    thread_max: usize,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_max.max(1))
        .build()
        .map_err(|e| AntsibullError::config(format!("cannot start download workers: {e}")))?;

    tracing::info!(
        "Collecting changelogs of {} collections and ansible-core",
        collectors.len()
    );
    pool.install(|| {
        rayon::join(
            || {
                collectors
                    .par_iter_mut()
                    .for_each(|collector| collector.download(source));
            },
            || core.download(source),
        )
    });

    let empty = collectors
        .iter()
        .filter(|collector| collector.state() == CollectorState::ReadyEmpty)
        .count();
    tracing::debug!("{empty} collectors finished without changelog data");
    Ok(())
}
