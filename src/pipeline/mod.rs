//! Pipeline orchestration for changelog builds.
//!
//! This module provides the glue shared by the CLI command handlers:
//! choosing a changelog source from the configuration, writing output
//! and exit codes.

mod output;
mod source;

pub use output::{write_output, OutputTarget};
pub use source::open_source;

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read the build data of a release
    #[error("Loading build data from {path} failed: {source}")]
    LoadFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// Collecting or classifying changelogs failed
    #[error("Collecting changelogs failed: {source}")]
    CollectFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Rendering release notes failed
    #[error("Rendering failed: {source}")]
    RenderFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Writing output files failed
    #[error("Writing {path} failed: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// An error occurred
    pub const ERROR: i32 = 1;
    /// A linted changelog has problems
    pub const LINT_VIOLATIONS: i32 = 3;
}
