//! Unified error types for antsibull.
//!
//! Network failures and missing changelogs are data gaps: the collectors
//! absorb them and the aggregator never sees them. Everything surfaced
//! through [`AntsibullError`] is either a structural problem with the
//! inputs (bad manifests, bad versions, malformed documents) or an IO
//! failure while writing output.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for antsibull operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AntsibullError {
    /// Errors while parsing changelog documents or metadata files
    #[error("Failed to parse: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// Malformed version strings
    #[error("Invalid version: {context}")]
    Version {
        context: String,
        #[source]
        source: VersionErrorKind,
    },

    /// Errors in `.deps` dependency manifests
    #[error("Invalid dependency manifest: {context}")]
    Manifest {
        context: String,
        #[source]
        source: ManifestErrorKind,
    },

    /// Errors while fetching remote artifacts
    #[error("Fetch failed: {context}")]
    Fetch {
        context: String,
        #[source]
        source: FetchErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid YAML: {0}")]
    InvalidYaml(String),

    #[error("Invalid field value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Document does not match the {expected} changes format: {message}")]
    FormatMismatch { expected: String, message: String },
}

/// Specific version error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VersionErrorKind {
    #[error("'{version}' is not a valid {scheme} version")]
    Malformed { version: String, scheme: String },

    #[error("Version string is empty")]
    Empty,
}

/// Specific manifest error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ManifestErrorKind {
    #[error("{0}")]
    InvalidFileFormat(String),

    #[error("Key '{0}' appears more than once")]
    DuplicateKey(String),

    #[error("Required key '{0}' is missing")]
    MissingKey(String),
}

/// Specific fetch error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchErrorKind {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for antsibull operations
pub type Result<T> = std::result::Result<T, AntsibullError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl AntsibullError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for a field with an unexpected value
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::parse(
            "invalid field value",
            ParseErrorKind::InvalidValue {
                field: field.into(),
                message: message.into(),
            },
        )
    }

    /// Create a version error for a string that does not parse under `scheme`
    pub fn malformed_version(version: impl Into<String>, scheme: impl Into<String>) -> Self {
        let version = version.into();
        Self::Version {
            context: format!("parsing '{version}'"),
            source: VersionErrorKind::Malformed {
                version,
                scheme: scheme.into(),
            },
        }
    }

    /// Create a manifest error
    pub fn manifest(context: impl Into<String>, source: ManifestErrorKind) -> Self {
        Self::Manifest {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch error
    pub fn fetch(context: impl Into<String>, source: FetchErrorKind) -> Self {
        Self::Fetch {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for AntsibullError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for AntsibullError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::parse(
            "YAML deserialization",
            ParseErrorKind::InvalidYaml(err.to_string()),
        )
    }
}

impl From<serde_json::Error> for AntsibullError {
    fn from(err: serde_json::Error) -> Self {
        Self::fetch(
            "JSON deserialization",
            FetchErrorKind::InvalidResponse(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are prepended to the error's existing context, so a
/// failure deep inside document parsing reads as
/// `"loading community.general: releases -> 1.0.0: invalid field value"`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<AntsibullError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: AntsibullError, new_ctx: &str) -> AntsibullError {
    match err {
        AntsibullError::Parse { context, source } => AntsibullError::Parse {
            context: chain_context(new_ctx, &context),
            source,
        },
        AntsibullError::Version { context, source } => AntsibullError::Version {
            context: chain_context(new_ctx, &context),
            source,
        },
        AntsibullError::Manifest { context, source } => AntsibullError::Manifest {
            context: chain_context(new_ctx, &context),
            source,
        },
        AntsibullError::Fetch { context, source } => AntsibullError::Fetch {
            context: chain_context(new_ctx, &context),
            source,
        },
        AntsibullError::Io {
            path,
            message,
            source,
        } => AntsibullError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        AntsibullError::Config(msg) => AntsibullError::Config(chain_context(new_ctx, &msg)),
        AntsibullError::Validation(msg) => {
            AntsibullError::Validation(chain_context(new_ctx, &msg))
        }
    }
}

/// Chain two context strings as "`new`: `existing`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to a validation error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to a validation error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AntsibullError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| AntsibullError::Validation(f().into()))
    }
}
