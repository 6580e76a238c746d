//! antsibull: changelog and porting guide builder for Ansible releases
//!
//! Collects the changelogs of ansible-core and every included collection
//! and merges them into the release notes of an Ansible major version.

#![allow(clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use antsibull::{
    cli::{
        self, AddReleaseConfig, BuildChangelogConfig, ChangelogKind, GenerateChangelogConfig,
        LintOutput,
    },
    config::{AppConfig, Validatable, DEFAULT_THREAD_MAX},
    pipeline::exit_codes,
    render::DocumentFormat,
};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "antsibull")]
#[command(version)]
#[command(about = "Build changelogs and porting guides for Ansible releases", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Error occurred
    3  Lint violations found

EXAMPLES:
    # Build the release notes of Ansible 9.1.0
    antsibull build-changelog 9.1.0 --data-dir ansible-build-data/9

    # Build offline from an unpacked tree of releases
    antsibull build-changelog 9.1.0 --data-dir 9 --source-dir mirror/

    # Render a collection changelog
    antsibull generate-changelog changelogs/changelog.yaml --collection community.general")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs (extracted for readability)
// ============================================================================

/// Arguments for the `build-changelog` subcommand
#[derive(Parser)]
struct BuildChangelogArgs {
    /// Ansible version to build the release notes for (e.g. 9.1.0)
    ansible_version: String,

    /// Directory with the `.deps` files and `changelog.yaml` of the major release
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory to write the release notes to (defaults to --data-dir)
    #[arg(long)]
    dest_data_dir: Option<PathBuf>,

    /// Read changelogs from a local tree instead of Galaxy and PyPI
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Cache directory for downloaded collection artifacts
    #[arg(long, env = "ANTSIBULL_COLLECTION_CACHE")]
    collection_cache: Option<PathBuf>,

    /// Number of parallel downloads
    #[arg(long, default_value_t = DEFAULT_THREAD_MAX)]
    thread_max: usize,

    /// Changelog formats to write (repeatable)
    #[arg(long = "format", value_enum)]
    formats: Vec<DocumentFormat>,
}

/// Arguments for the `generate-changelog` subcommand
#[derive(Parser)]
struct GenerateChangelogArgs {
    /// Path to the changelog.yaml to render
    changelog: PathBuf,

    /// Kind of changelog
    #[arg(long, value_enum, default_value = "collection")]
    kind: ChangelogKind,

    /// Collection name (required for collection changelogs)
    #[arg(long)]
    collection: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "rst")]
    output: DocumentFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `add-release` subcommand
#[derive(Parser)]
struct AddReleaseArgs {
    /// Ansible version of the new release
    version: String,

    /// Directory with the `changelog.yaml` of the major release
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Release date (YYYY-MM-DD); today if not specified
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Release summary text
    #[arg(long)]
    release_summary: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the combined changelog and porting guide of an Ansible release
    BuildChangelog(BuildChangelogArgs),

    /// Render the release notes of a single changelog.yaml
    GenerateChangelog(GenerateChangelogArgs),

    /// Check changelog.yaml files for structural problems
    LintChangelogYaml {
        /// Files to lint
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: LintOutput,
    },

    /// Record a new Ansible release in changelog.yaml
    AddRelease(AddReleaseArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .antsibull.yaml in the current directory
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    // Dispatch to command handlers
    match cli.command {
        Commands::BuildChangelog(args) => {
            let overrides = AppConfig::builder()
                .thread_max(args.thread_max)
                .collection_cache(args.collection_cache)
                .source_dir(args.source_dir)
                .changelog_formats(if args.formats.is_empty() {
                    AppConfig::default().build.changelog_formats
                } else {
                    args.formats
                })
                .build();
            let (app, loaded_from) =
                AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
            if let Some(path) = &loaded_from {
                tracing::debug!("Loaded configuration from {}", path.display());
            }
            let errors = app.validate();
            if !errors.is_empty() {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                anyhow::bail!("invalid configuration: {}", messages.join("; "));
            }

            let report = cli::run_build_changelog(BuildChangelogConfig {
                ansible_version: args.ansible_version,
                data_dir: args.data_dir,
                dest_data_dir: args.dest_data_dir,
                app,
                quiet: cli.quiet,
            })?;
            if !report.is_empty() {
                print!("{report}");
            }
            Ok(())
        }

        Commands::GenerateChangelog(args) => cli::run_generate_changelog(GenerateChangelogConfig {
            changelog: args.changelog,
            kind: args.kind,
            collection: args.collection,
            format: args.output,
            output_file: args.output_file,
            quiet: cli.quiet,
        }),

        Commands::LintChangelogYaml { paths, output } => {
            let exit_code = cli::run_lint_changelog_yaml(paths, output)?;
            if exit_code != exit_codes::SUCCESS {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::AddRelease(args) => cli::run_add_release(AddReleaseConfig {
            data_dir: args.data_dir,
            version: args.version,
            date: args.date,
            release_summary: args.release_summary,
        }),

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "antsibull", &mut io::stdout());
            Ok(())
        }

        Commands::ConfigSchema { output } => {
            let schema = antsibull::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) =
                    antsibull::config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(())
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    ::dirs::config_dir().map(|p| p.join("antsibull").display().to_string()),
                    ::dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in &[
                    ".antsibull.yaml",
                    ".antsibull.yml",
                    "antsibull.yaml",
                    "antsibull.yml",
                ] {
                    eprintln!("  {name}");
                }
                eprintln!();
                match antsibull::config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(())
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".antsibull.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = antsibull::config::generate_full_example_config();
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(())
            }
        },
    }
}
