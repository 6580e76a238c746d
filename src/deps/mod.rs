//! Dependency manifests of Ansible releases.
//!
//! A `.deps` file lists, one `name: version` pair per line, the exact
//! collection versions shipped with one Ansible release. Two reserved keys
//! name the release itself and the ansible-core version it was built
//! against:
//!
//! ```text
//! _ansible_version: 9.1.0
//! _ansible_core_version: 2.16.2
//! community.general: 8.1.0
//! ```
//!
//! `_acd_version` and `_ansible_base_version` are accepted as legacy
//! spellings.

mod meta;

pub use meta::{CollectionMetadata, CollectionsMetadata};

use crate::error::{AntsibullError, ErrorContext, ManifestErrorKind, Result};
use crate::version::PypiVersion;
use indexmap::IndexMap;
use std::path::Path;

const ANSIBLE_VERSION_KEYS: &[&str] = &["_ansible_version", "_acd_version"];
const CORE_VERSION_KEYS: &[&str] = &["_ansible_core_version", "_ansible_base_version"];

/// Pseudo-dependency recording the supported Python range.
const PYTHON_KEY: &str = "_python";

/// Contents of one dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFileData {
    /// Version of the Ansible release
    pub ansible_version: String,
    /// Version of ansible-core the release was built against
    pub core_version: String,
    /// Collection name to collection version
    pub deps: IndexMap<String, String>,
}

/// Non-empty lines of a manifest that are not comments.
pub fn parse_pieces(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

impl DependencyFileData {
    pub fn new(
        ansible_version: impl Into<String>,
        core_version: impl Into<String>,
        deps: IndexMap<String, String>,
    ) -> Self {
        Self {
            ansible_version: ansible_version.into(),
            core_version: core_version.into(),
            deps,
        }
    }

    /// Parse manifest text. `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let mut ansible_version: Option<String> = None;
        let mut core_version: Option<String> = None;
        let mut deps = IndexMap::new();

        for line in parse_pieces(content) {
            let (key, value) = match line.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (line, ""),
            };

            if ANSIBLE_VERSION_KEYS.contains(&key) {
                if ansible_version.replace(value.to_string()).is_some() {
                    return Err(AntsibullError::manifest(
                        origin,
                        ManifestErrorKind::DuplicateKey("_ansible_version/_acd_version".into()),
                    ));
                }
                continue;
            }
            if CORE_VERSION_KEYS.contains(&key) {
                if core_version.replace(value.to_string()).is_some() {
                    return Err(AntsibullError::manifest(
                        origin,
                        ManifestErrorKind::DuplicateKey(
                            "_ansible_base_version/_ansible_core_version".into(),
                        ),
                    ));
                }
                continue;
            }
            deps.insert(key.to_string(), value.to_string());
        }

        let core_version = core_version.ok_or_else(|| {
            AntsibullError::manifest(
                origin,
                ManifestErrorKind::MissingKey("ansible_core_version".into()),
            )
        })?;
        let ansible_version = ansible_version.ok_or_else(|| {
            AntsibullError::manifest(
                origin,
                ManifestErrorKind::MissingKey("ansible_version".into()),
            )
        })?;

        Ok(Self {
            ansible_version,
            core_version,
            deps,
        })
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AntsibullError::io(path, e))?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parsed Ansible release version.
    pub fn ansible_pypi_version(&self) -> Result<PypiVersion> {
        PypiVersion::parse(&self.ansible_version).context("_ansible_version")
    }

    /// Serialize in `.deps` format with collections sorted by name.
    ///
    /// Releases up to Ansible 5 record the core version under the legacy
    /// `_ansible_base_version` key.
    pub fn to_deps_string(&self) -> Result<String> {
        let core_key = if self.ansible_pypi_version()?.major() > 5 {
            "_ansible_core_version"
        } else {
            "_ansible_base_version"
        };
        let mut records: Vec<String> = self
            .deps
            .iter()
            .map(|(name, version)| format!("{name}: {version}"))
            .collect();
        records.sort();

        let mut out = format!(
            "_ansible_version: {}\n{core_key}: {}\n",
            self.ansible_version, self.core_version
        );
        for record in records {
            out.push_str(&record);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = self.to_deps_string()?;
        std::fs::write(path, content).map_err(|e| AntsibullError::io(path, e))
    }
}

/// Load every `*.deps` manifest in `dir`.
///
/// Manifests for releases newer than `newest` are skipped, and the
/// `_python` pseudo-dependency is dropped. Files are read in name order.
pub fn scan_deps_dir(dir: &Path, newest: &PypiVersion) -> Result<Vec<DependencyFileData>> {
    let entries = std::fs::read_dir(dir).map_err(|e| AntsibullError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AntsibullError::io(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "deps") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut manifests = Vec::with_capacity(paths.len());
    for path in paths {
        let mut data = DependencyFileData::load(&path)?;
        data.deps.shift_remove(PYTHON_KEY);
        let version = data
            .ansible_pypi_version()
            .with_context(|| path.display().to_string())?;
        if version > *newest {
            tracing::info!(
                "Ignoring {}, since {} is newer than {newest}",
                path.display(),
                data.ansible_version
            );
            continue;
        }
        manifests.push(data);
    }
    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPS: &str = "\
# Generated
_ansible_version: 9.1.0
_ansible_core_version: 2.16.2

community.general: 8.1.0
ansible.posix: 1.5.4
_python: >=3.10
";

    #[test]
    fn test_parse_manifest() {
        let data = DependencyFileData::parse(DEPS, "ansible-9.1.0.deps").unwrap();
        assert_eq!(data.ansible_version, "9.1.0");
        assert_eq!(data.core_version, "2.16.2");
        assert_eq!(data.deps["community.general"], "8.1.0");
        assert_eq!(data.deps.len(), 3);
    }

    #[test]
    fn test_legacy_keys() {
        let content = "_acd_version: 2.10.0\n_ansible_base_version: 2.10.1\nfoo.bar: 1.0.0\n";
        let data = DependencyFileData::parse(content, "x").unwrap();
        assert_eq!(data.ansible_version, "2.10.0");
        assert_eq!(data.core_version, "2.10.1");
    }

    #[test]
    fn test_missing_and_duplicate_keys() {
        let err = DependencyFileData::parse("_ansible_version: 9.0.0\n", "x").unwrap_err();
        assert!(matches!(
            err,
            AntsibullError::Manifest {
                source: ManifestErrorKind::MissingKey(_),
                ..
            }
        ));

        let content = "_ansible_version: 9.0.0\n_acd_version: 9.0.0\n_ansible_core_version: 2.16.0\n";
        let err = DependencyFileData::parse(content, "x").unwrap_err();
        assert!(matches!(
            err,
            AntsibullError::Manifest {
                source: ManifestErrorKind::DuplicateKey(_),
                ..
            }
        ));
    }

    #[test]
    fn test_write_uses_legacy_key_for_old_releases() {
        let mut deps = IndexMap::new();
        deps.insert("z.z".to_string(), "1.0.0".to_string());
        deps.insert("a.a".to_string(), "2.0.0".to_string());
        let old = DependencyFileData::new("4.2.0", "2.11.6", deps.clone());
        assert_eq!(
            old.to_deps_string().unwrap(),
            "_ansible_version: 4.2.0\n_ansible_base_version: 2.11.6\na.a: 2.0.0\nz.z: 1.0.0\n"
        );
        let new = DependencyFileData::new("9.0.0", "2.16.0", deps);
        assert!(new
            .to_deps_string()
            .unwrap()
            .contains("_ansible_core_version: 2.16.0\n"));
    }

    #[test]
    fn test_scan_skips_newer_and_python() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ansible-9.0.0.deps"), DEPS.replace("9.1.0", "9.0.0"))
            .unwrap();
        std::fs::write(dir.path().join("ansible-9.1.0.deps"), DEPS).unwrap();
        std::fs::write(dir.path().join("ansible-9.build"), "ignored").unwrap();

        let newest = PypiVersion::parse("9.0.0").unwrap();
        let manifests = scan_deps_dir(dir.path(), &newest).unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].ansible_version, "9.0.0");
        assert!(!manifests[0].deps.contains_key("_python"));
    }
}
