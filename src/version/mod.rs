//! Version schemes and range arithmetic.
//!
//! Collections version with semver; ansible-core and the Ansible package
//! use PEP 440. Every changelog document is tied to exactly one scheme,
//! and all comparisons, range tests and sorting go through it.

mod pypi;

pub use pypi::{PreRelease, PypiVersion};

use crate::error::{AntsibullError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which version grammar a changelog document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionScheme {
    /// PEP 440, used by ansible-core and the Ansible package
    Core,
    /// Semantic versioning, used by collections
    Semantic,
}

impl VersionScheme {
    /// Parse `version` under this scheme.
    pub fn parse(self, version: &str) -> Result<SchemeVersion> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(AntsibullError::Version {
                context: format!("parsing {self} version"),
                source: crate::error::VersionErrorKind::Empty,
            });
        }
        match self {
            Self::Core => PypiVersion::parse(trimmed).map(SchemeVersion::Core),
            Self::Semantic => semver::Version::parse(trimmed)
                .map(SchemeVersion::Semantic)
                .map_err(|_| AntsibullError::malformed_version(trimmed, self.to_string())),
        }
    }

    /// Compare two version strings under this scheme.
    pub fn compare(self, a: &str, b: &str) -> Result<Ordering> {
        Ok(self.parse(a)?.cmp(&self.parse(b)?))
    }

    /// Whether `version` is a release (not a pre-release) under this scheme.
    pub fn is_release(self, version: &str) -> Result<bool> {
        Ok(!self.parse(version)?.is_prerelease())
    }

    /// Parse and sort version strings, newest first.
    pub fn sort_descending<'a, I>(self, versions: I) -> Result<Vec<(SchemeVersion, String)>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut parsed = versions
            .into_iter()
            .map(|raw| self.parse(raw).map(|v| (v, raw.clone())))
            .collect::<Result<Vec<_>>>()?;
        parsed.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(parsed)
    }
}

impl fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => write!(f, "PEP 440"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

/// A version parsed under a specific [`VersionScheme`].
///
/// Versions from different schemes never meet in practice; ordering between
/// them falls back to the scheme tag so the type stays totally ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemeVersion {
    Core(PypiVersion),
    Semantic(semver::Version),
}

impl SchemeVersion {
    #[must_use]
    pub fn scheme(&self) -> VersionScheme {
        match self {
            Self::Core(_) => VersionScheme::Core,
            Self::Semantic(_) => VersionScheme::Semantic,
        }
    }

    /// True for pre-releases (`1.0.0-beta.1`, `2.16.0rc1`, `2.17.0.dev0`).
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        match self {
            Self::Core(v) => v.is_prerelease(),
            Self::Semantic(v) => !v.pre.is_empty(),
        }
    }

    /// Range test with exclusive lower and inclusive upper bound.
    ///
    /// An absent bound is unbounded on that side.
    #[must_use]
    pub fn in_range(&self, after: Option<&SchemeVersion>, until: Option<&SchemeVersion>) -> bool {
        after.map_or(true, |after| self > after) && until.map_or(true, |until| self <= until)
    }
}

impl Ord for SchemeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Core(a), Self::Core(b)) => a.cmp(b),
            (Self::Semantic(a), Self::Semantic(b)) => a.cmp(b),
            (Self::Core(_), Self::Semantic(_)) => Ordering::Less,
            (Self::Semantic(_), Self::Core(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SchemeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SchemeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(v) => write!(f, "{v}"),
            Self::Semantic(v) => write!(f, "{v}"),
        }
    }
}
