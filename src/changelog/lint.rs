//! Linting for `changelog.yaml` files.
//!
//! Works on the untyped YAML tree so that every problem in a file is
//! reported, not just the first one a typed parse would trip over.

use super::config::ChangelogConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12][0-9]|3[01])$").expect("static regex")
});

/// Plugin types that may appear under `plugins`.
pub const PLUGIN_TYPES: &[&str] = &[
    "become",
    "cache",
    "callback",
    "cliconf",
    "connection",
    "filter",
    "httpapi",
    "inventory",
    "lookup",
    "netconf",
    "shell",
    "strategy",
    "test",
    "vars",
];

/// Object types that may appear under `objects`.
pub const OBJECT_TYPES: &[&str] = &["playbook", "role"];

/// One problem found in a changelog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintViolation {
    /// File the problem was found in
    pub path: PathBuf,
    /// Line (0 when unknown)
    pub line: usize,
    /// Column (0 when unknown)
    pub column: usize,
    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for LintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.path.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

#[derive(Debug, Clone)]
enum PathPart {
    Key(String),
    Index(usize),
}

impl From<&str> for PathPart {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

fn format_yaml_path(path: &[PathPart]) -> String {
    path.iter()
        .map(|part| match part {
            PathPart::Key(key) => format!("'{key}'"),
            PathPart::Index(idx) => idx.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    String,
    List,
    Mapping,
}

impl Expected {
    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::List, Value::Sequence(_))
                | (Self::Mapping, Value::Mapping(_))
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::List => "a list",
            Self::Mapping => "a mapping",
        }
    }
}

/// Linter for one `changelog.yaml` file.
#[derive(Debug)]
pub struct ChangelogYamlLinter {
    path: PathBuf,
    config: ChangelogConfig,
    violations: Vec<LintViolation>,
}

impl ChangelogYamlLinter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = ChangelogConfig::collection("");
        Self {
            path,
            config,
            violations: Vec::new(),
        }
    }

    fn error(&mut self, message: String) {
        self.violations.push(LintViolation {
            path: self.path.clone(),
            line: 0,
            column: 0,
            message,
        });
    }

    fn verify_type(
        &mut self,
        value: Option<&Value>,
        expected: Expected,
        path: &[PathPart],
        allow_none: bool,
    ) -> bool {
        let value = value.unwrap_or(&Value::Null);
        if allow_none && value.is_null() {
            return true;
        }
        if expected.matches(value) {
            return true;
        }
        let expected_str = if allow_none {
            format!("null or {}", expected.name())
        } else {
            expected.name().to_string()
        };
        self.error(format!(
            "{} is expected to be {expected_str}, but got {}",
            format_yaml_path(path),
            describe(value)
        ));
        false
    }

    fn check_version(&mut self, version: &Value, what: &str) -> Option<semver::Version> {
        let parsed = match version {
            Value::String(s) => semver::Version::parse(s).map_err(|e| e.to_string()),
            _ => Err("expecting string".to_string()),
        };
        match parsed {
            Ok(version) => Some(version),
            Err(reason) => {
                self.error(format!(
                    "{what}: error while parsing version {}: {reason}",
                    describe(version)
                ));
                None
            }
        }
    }

    fn verify_plugin(&mut self, plugin: &Value, path: Vec<PathPart>, is_module: bool) {
        if !self.verify_type(Some(plugin), Expected::Mapping, &path, false) {
            return;
        }
        let with = |key: &str| {
            let mut p = path.clone();
            p.push(key.into());
            p
        };

        let name = plugin.get("name");
        if self.verify_type(name, Expected::String, &with("name"), false) {
            if name.and_then(Value::as_str).is_some_and(|n| n.contains('.')) {
                self.error(format!("{} must not be a FQCN", format_yaml_path(&with("name"))));
            }
        }
        self.verify_type(
            plugin.get("description"),
            Expected::String,
            &with("description"),
            false,
        );

        let namespace = plugin.get("namespace");
        if is_module {
            if self.verify_type(namespace, Expected::String, &with("namespace"), false) {
                let invalid = namespace
                    .and_then(Value::as_str)
                    .is_some_and(|ns| ns.contains([' ', '/', '\\']));
                if invalid {
                    self.error(format!(
                        "{} must not contain spaces or slashes",
                        format_yaml_path(&with("namespace"))
                    ));
                }
            }
        } else if namespace.is_some_and(|ns| !ns.is_null()) {
            self.error(format!("{} must be null", format_yaml_path(&with("namespace"))));
        }
    }

    fn lint_typed_lists(&mut self, version: &str, key: &str, value: &Value, known: &[&str]) {
        let Some(mapping) = value.as_mapping() else {
            return;
        };
        for (kind, entries) in mapping {
            let base = vec![PathPart::from("releases"), PathPart::from(version), PathPart::from(key)];
            let Some(kind) = scalar_key(kind) else {
                self.error(format!("{} has a non-string key", format_yaml_path(&base)));
                continue;
            };
            if !known.contains(&kind.as_str()) {
                self.error(format!(
                    "Unknown {} type '{kind}' in {}",
                    key.trim_end_matches('s'),
                    format_yaml_path(&base)
                ));
            }
            let mut list_path = base.clone();
            list_path.push(PathPart::Key(kind.clone()));
            if self.verify_type(Some(entries), Expected::List, &list_path, false) {
                for (idx, plugin) in entries.as_sequence().into_iter().flatten().enumerate() {
                    let mut path = list_path.clone();
                    path.push(PathPart::Index(idx));
                    self.verify_plugin(plugin, path, false);
                }
            }
        }
    }

    fn lint_changes(&mut self, version: &str, changes: &Value) {
        let base = vec![
            PathPart::from("releases"),
            PathPart::from(version),
            PathPart::from("changes"),
        ];
        let Some(mapping) = changes.as_mapping() else {
            return;
        };
        for (section, content) in mapping {
            let Some(section) = scalar_key(section) else {
                self.error(format!("{}: invalid section key", format_yaml_path(&base)));
                continue;
            };
            if !self.config.is_known_section(&section) {
                self.error(format!(
                    "{}: invalid section: {section}",
                    format_yaml_path(&base)
                ));
                continue;
            }
            let mut path = base.clone();
            path.push(PathPart::Key(section.clone()));
            if self.config.is_prelude(&section) {
                self.verify_type(Some(content), Expected::String, &path, false);
            } else if self.verify_type(Some(content), Expected::List, &path, false) {
                for (idx, item) in content.as_sequence().into_iter().flatten().enumerate() {
                    let mut item_path = path.clone();
                    item_path.push(PathPart::Index(idx));
                    self.verify_type(Some(item), Expected::String, &item_path, false);
                }
            }
        }
    }

    fn lint_release(&mut self, version: &str, entry: &Value) {
        let path = |key: &str| {
            vec![
                PathPart::from("releases"),
                PathPart::from(version),
                PathPart::from(key),
            ]
        };

        let release_date = entry.get("release_date");
        if self.verify_type(release_date, Expected::String, &path("release_date"), false) {
            let valid = release_date
                .and_then(Value::as_str)
                .is_some_and(|date| ISO_DATE.is_match(date));
            if !valid {
                self.error(format!(
                    "{} must be a ISO date (YYYY-MM-DD)",
                    format_yaml_path(&path("release_date"))
                ));
            }
        }

        self.verify_type(entry.get("codename"), Expected::String, &path("codename"), true);

        if let Some(changes) = entry.get("changes") {
            if self.verify_type(Some(changes), Expected::Mapping, &path("changes"), true) {
                self.lint_changes(version, changes);
            }
        }

        if let Some(modules) = entry.get("modules") {
            if self.verify_type(Some(modules), Expected::List, &path("modules"), true) {
                for (idx, module) in modules.as_sequence().into_iter().flatten().enumerate() {
                    let mut module_path = path("modules");
                    module_path.push(PathPart::Index(idx));
                    self.verify_plugin(module, module_path, true);
                }
            }
        }

        for (key, known) in [("plugins", PLUGIN_TYPES), ("objects", OBJECT_TYPES)] {
            if let Some(value) = entry.get(key) {
                if self.verify_type(Some(value), Expected::Mapping, &path(key), true) {
                    self.lint_typed_lists(version, key, value, known);
                }
            }
        }

        if let Some(fragments) = entry.get("fragments") {
            if self.verify_type(Some(fragments), Expected::List, &path("fragments"), true) {
                for (idx, fragment) in fragments.as_sequence().into_iter().flatten().enumerate() {
                    let mut fragment_path = path("fragments");
                    fragment_path.push(PathPart::Index(idx));
                    self.verify_type(Some(fragment), Expected::String, &fragment_path, false);
                }
            }
        }
    }

    /// Lint already-loaded YAML.
    pub fn lint_value(mut self, document: &Value) -> Vec<LintViolation> {
        let ancestor_value = document.get("ancestor").filter(|v| !v.is_null()).cloned();
        let ancestor = ancestor_value
            .as_ref()
            .and_then(|value| self.check_version(value, "Invalid ancestor version"));

        let releases = document.get("releases");
        if self.verify_type(releases, Expected::Mapping, &[PathPart::from("releases")], false) {
            let entries: Vec<(Value, Value)> = releases
                .and_then(Value::as_mapping)
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            for (key, entry) in entries {
                let version = self.check_version(&key, "Invalid release version");
                let version_str = scalar_key(&key).unwrap_or_default();
                if let (Some(version), Some(ancestor)) = (&version, &ancestor) {
                    if version <= ancestor {
                        self.error(format!(
                            "release version '{version_str}' must come after ancestor version '{ancestor}'"
                        ));
                    }
                }
                let path = vec![PathPart::from("releases"), PathPart::Key(version_str.clone())];
                if self.verify_type(Some(&entry), Expected::Mapping, &path, false) {
                    self.lint_release(&version_str, &entry);
                }
            }
        }

        self.violations
    }

    /// Load and lint the file.
    pub fn lint(self) -> Vec<LintViolation> {
        let parsed = std::fs::read(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_yaml::from_slice::<Value>(&bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(document) => self.lint_value(&document),
            Err(reason) => {
                let mut linter = self;
                linter.error(format!("error while parsing YAML: {reason}"));
                linter.violations
            }
        }
    }
}

/// Lint a `changelog.yaml` file.
pub fn lint_changelog_yaml(path: &Path) -> Vec<LintViolation> {
    ChangelogYamlLinter::new(path).lint()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(yaml: &str) -> Vec<String> {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        ChangelogYamlLinter::new("changelog.yaml")
            .lint_value(&value)
            .into_iter()
            .map(|v| v.message)
            .collect()
    }

    #[test]
    fn test_valid_document_has_no_violations() {
        let errors = lint(
            r#"
ancestor: 1.0.0
releases:
  1.1.0:
    release_date: '2021-02-01'
    codename: null
    changes:
      release_summary: Hello.
      bugfixes:
        - fixed.
    modules:
      - name: foo
        namespace: cloud.aws
        description: Foo
    plugins:
      lookup:
        - name: bar
          namespace: null
          description: Bar
    fragments:
      - a.yml
"#,
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_detects_bad_dates_and_versions() {
        let errors = lint(
            r#"
ancestor: 2.0.0
releases:
  1.5.0:
    release_date: '2021-13-01'
  nope:
    release_date: '2021-01-01'
"#,
        );
        assert!(errors.iter().any(|e| e.contains("must come after ancestor")));
        assert!(errors.iter().any(|e| e.contains("ISO date")));
        assert!(errors.iter().any(|e| e.contains("Invalid release version")));
    }

    #[test]
    fn test_detects_bad_plugins() {
        let errors = lint(
            r#"
releases:
  1.0.0:
    release_date: '2021-01-01'
    modules:
      - name: ns.coll.foo
        namespace: 'bad space'
        description: Foo
    plugins:
      lookup:
        - name: bar
          namespace: nope
          description: 42
      weird:
        - name: x
          namespace: null
          description: X
"#,
        );
        assert!(errors.iter().any(|e| e.contains("must not be a FQCN")));
        assert!(errors.iter().any(|e| e.contains("spaces or slashes")));
        assert!(errors.iter().any(|e| e.contains("must be null")));
        assert!(errors.iter().any(|e| e.contains("'description' is expected to be a string")));
        assert!(errors.iter().any(|e| e.contains("Unknown plugin type 'weird'")));
    }

    #[test]
    fn test_detects_bad_changes() {
        let errors = lint(
            r#"
releases:
  1.0.0:
    release_date: '2021-01-01'
    changes:
      release_summary:
        - not prose
      whatever:
        - x
      bugfixes: just a string
"#,
        );
        assert!(errors.iter().any(|e| e.contains("invalid section: whatever")));
        assert!(errors
            .iter()
            .any(|e| e.contains("'release_summary' is expected to be a string")));
        assert!(errors.iter().any(|e| e.contains("'bugfixes' is expected to be a list")));
    }

    #[test]
    fn test_yaml_path_format() {
        let path = vec![
            PathPart::from("releases"),
            PathPart::from("1.0.0"),
            PathPart::Index(2),
        ];
        assert_eq!(format_yaml_path(&path), "'releases' -> '1.0.0' -> 2");
    }

    #[test]
    fn test_missing_releases() {
        let errors = lint("ancestor: null\n");
        assert_eq!(errors, vec!["'releases' is expected to be a mapping, but got null"]);
    }
}
