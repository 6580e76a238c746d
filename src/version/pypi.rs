//! PEP 440 versions as used by ansible-core and the Ansible package.

use crate::error::{AntsibullError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PEP440: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        ^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?:
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)
        )?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .expect("static regex")
});

/// Pre-release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha(u64),
    Beta(u64),
    Candidate(u64),
}

impl PreRelease {
    fn new(label: &str, number: u64) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Self::Alpha(number),
            "b" | "beta" => Self::Beta(number),
            _ => Self::Candidate(number),
        }
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha(n) => write!(f, "a{n}"),
            Self::Beta(n) => write!(f, "b{n}"),
            Self::Candidate(n) => write!(f, "rc{n}"),
        }
    }
}

/// A parsed PEP 440 version.
///
/// Ordering follows PEP 440: `1.0.dev1 < 1.0a1 < 1.0rc1 < 1.0 < 1.0.post1`,
/// trailing zero release components are insignificant (`2.10 == 2.10.0`).
#[derive(Debug, Clone)]
pub struct PypiVersion {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

impl PypiVersion {
    /// Parse a version string.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = PEP440
            .captures(input)
            .ok_or_else(|| AntsibullError::malformed_version(input, "PEP 440"))?;

        let number = |name: &str| -> Result<Option<u64>> {
            caps.name(name)
                .map(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map_err(|_| AntsibullError::malformed_version(input, "PEP 440"))
                })
                .transpose()
        };

        let release = caps
            .name("release")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map_err(|_| AntsibullError::malformed_version(input, "PEP 440"))
            })
            .collect::<Result<Vec<_>>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some(PreRelease::new(label.as_str(), number("pre_n")?.unwrap_or(0))),
            None => None,
        };
        let post = match (number("post_n1")?, caps.name("post_l")) {
            (Some(n), _) => Some(n),
            (None, Some(_)) => Some(number("post_n2")?.unwrap_or(0)),
            (None, None) => None,
        };
        let dev = match caps.name("dev_l") {
            Some(_) => Some(number("dev_n")?.unwrap_or(0)),
            None => None,
        };

        Ok(Self {
            epoch: number("epoch")?.unwrap_or(0),
            release,
            pre,
            post,
            dev,
            local: caps.name("local").map(|m| m.as_str().to_ascii_lowercase()),
        })
    }

    /// Release components (`[2, 16, 3]` for `2.16.3`).
    #[must_use]
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// First release component.
    #[must_use]
    pub fn major(&self) -> u64 {
        self.release.first().copied().unwrap_or(0)
    }

    /// Second release component, zero when absent.
    #[must_use]
    pub fn minor(&self) -> u64 {
        self.release.get(1).copied().unwrap_or(0)
    }

    /// Third release component, zero when absent.
    #[must_use]
    pub fn micro(&self) -> u64 {
        self.release.get(2).copied().unwrap_or(0)
    }

    /// Pre-release phase, if any.
    #[must_use]
    pub fn pre(&self) -> Option<PreRelease> {
        self.pre
    }

    /// True for alpha, beta, candidate and development releases.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// The `major.minor` pair.
    #[must_use]
    pub fn major_minor(&self) -> (u64, u64) {
        (self.major(), self.minor())
    }

    fn significant_release(&self) -> &[u64] {
        let len = self
            .release
            .iter()
            .rposition(|&part| part != 0)
            .map_or(0, |idx| idx + 1);
        &self.release[..len]
    }

    // Keys mirror the `packaging` comparison tuple: a dev-only release sorts
    // before any pre-release of the same version, a missing post sorts first,
    // a missing dev sorts last.
    fn pre_key(&self) -> (u8, Option<PreRelease>) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, None),
            (Some(pre), _, _) => (1, Some(pre)),
            (None, _, _) => (2, None),
        }
    }

    fn post_key(&self) -> (u8, u64) {
        match self.post {
            None => (0, 0),
            Some(n) => (1, n),
        }
    }

    fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

impl FromStr for PypiVersion {
    type Err = AntsibullError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PypiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some(pre) = self.pre {
            write!(f, "{pre}")?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

impl PartialEq for PypiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PypiVersion {}

impl PartialOrd for PypiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PypiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.significant_release().cmp(other.significant_release()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl std::hash::Hash for PypiVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.epoch.hash(state);
        self.significant_release().hash(state);
        self.pre_key().hash(state);
        self.post_key().hash(state);
        self.dev_key().hash(state);
        self.local.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PypiVersion {
        PypiVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_components() {
        let version = v("2.16.3");
        assert_eq!(version.release(), &[2, 16, 3]);
        assert_eq!(version.major_minor(), (2, 16));
        assert!(!version.is_prerelease());

        let version = v("9.0.0rc1");
        assert_eq!(version.pre(), Some(PreRelease::Candidate(1)));
        assert!(version.is_prerelease());

        assert!(v("2.17.0.dev0").is_prerelease());
        assert!(!v("2.17.0.post1").is_prerelease());
    }

    #[test]
    fn test_pep440_ordering() {
        let ordered = [
            "1.0.dev1", "1.0a1", "1.0a2.dev3", "1.0a2", "1.0b1", "1.0rc1", "1.0", "1.0.post1",
            "1.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("2.10"), v("2.10.0"));
        assert!(v("2.9.27") < v("2.10"));
    }

    #[test]
    fn test_normalized_display() {
        assert_eq!(v("9.0.0-beta.2").to_string(), "9.0.0b2");
        assert_eq!(v("v2.15.0rc1").to_string(), "2.15.0rc1");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(PypiVersion::parse("not-a-version").is_err());
        assert!(PypiVersion::parse("").is_err());
        assert!(PypiVersion::parse("1..0").is_err());
    }
}
