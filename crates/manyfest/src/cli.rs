use clap::{Parser, Subcommand, ValueEnum};
use manyfest_workspaces::ConflictPolicy;
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Usage, configuration, or user-input error exit code
pub const EXIT_CLI: i32 = 2;
/// Resolution, provider, or I/O error exit code
pub const EXIT_RESOLVE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI, configuration, or user-input error (exit code 2)
    #[error("{message}")]
    #[diagnostic(code(manyfest::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Workspace resolution or provider error (exit code 3)
    #[error("{message}")]
    #[diagnostic(code(manyfest::cli::resolve))]
    Resolve {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(manyfest::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `manyfest_workspaces::Error` to the matching `CliError` variant.
///
/// - Unknown workspaces, missing entry points, and bad workspace config -> Config (exit code 2)
/// - Inconsistent metadata, cycles, and provider failures -> Resolve (exit code 3)
/// - I/O and JSON errors -> Other (exit code 3)
impl From<manyfest_workspaces::Error> for CliError {
    fn from(err: manyfest_workspaces::Error) -> Self {
        use manyfest_workspaces::Error;

        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        match err {
            Error::WorkspaceNotFound { .. }
            | Error::NoEntryPoint { .. }
            | Error::InvalidWorkspaceConfig { .. }
            | Error::ProjectRootNotFound { .. } => Self::Config { message, help },
            Error::MalformedWorkspaceData { .. }
            | Error::CyclicWorkspaceDependency { .. }
            | Error::MetadataCommandFailed { .. } => Self::Resolve { message, help },
            Error::Io { .. } | Error::Json { .. } => Self::Other { message, help },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Resolve { .. } | CliError::Other { .. } => EXIT_RESOLVE,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Resolve { .. } => "resolve",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        // Ensure output is flushed before potential process exit
        let _ = io::stderr().flush();
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Source of workspace metadata.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum MetadataSource {
    /// Ask `yarn workspaces info`
    #[default]
    Yarn,
    /// Expand the root package.json `workspaces` globs
    PackageJson,
}

/// Main CLI entry point for manyfest.
///
/// Flattens a monorepo workspace into the self-contained manifest of its bundle.
#[derive(Parser, Debug)]
#[command(name = "manyfest")]
#[command(about = "Flatten monorepo workspaces into bundle-ready package manifests")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Directory to start project root discovery from.
    #[arg(
        short = 'C',
        long,
        global = true,
        env = "MANYFEST_CWD",
        value_name = "DIR",
        help = "Run as if started in DIR"
    )]
    pub cwd: Option<PathBuf>,

    /// Where workspace metadata comes from.
    #[arg(
        long,
        global = true,
        env = "MANYFEST_METADATA",
        value_enum,
        default_value_t = MetadataSource::Yarn,
        help = "Workspace metadata source"
    )]
    pub metadata: MetadataSource,

    /// Path to a configuration file.
    #[arg(
        long,
        global = true,
        env = "MANYFEST_CONFIG",
        value_name = "FILE",
        help = "Configuration file (defaults to manyfest.toml at the project root)"
    )]
    pub config: Option<PathBuf>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: crate::tracing::LogLevel,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "MANYFEST_LOG_FORMAT",
        value_enum,
        default_value_t = crate::tracing::TracingFormat::Compact,
        help = "Log format on stderr"
    )]
    pub log_format: crate::tracing::TracingFormat,

    /// Emit JSON logs and JSON error envelopes.
    #[arg(long, global = true, help = "Emit JSON logs and JSON error envelopes")]
    pub json: bool,

    /// Workspaces to leave out of the project (repeatable).
    #[arg(
        long,
        global = true,
        action = clap::ArgAction::Append,
        value_name = "NAME",
        help = "Leave a workspace out of the project (repeatable)"
    )]
    pub ignore: Vec<String>,
}

impl Cli {
    /// Log format to initialize tracing with; `--json` forces JSON.
    #[must_use]
    pub const fn tracing_format(&self) -> crate::tracing::TracingFormat {
        if self.json {
            crate::tracing::TracingFormat::Json
        } else {
            self.log_format
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the flattened manifest of one or more workspaces.
    #[command(about = "Compute the flattened manifest of one or more workspaces")]
    Flatten {
        /// Workspaces to flatten.
        #[arg(value_name = "NAME", required_unless_present = "all")]
        names: Vec<String>,
        /// Flatten every workspace that declares a `main`.
        #[arg(long, conflicts_with = "names", help = "Flatten every workspace with a main")]
        all: bool,
        /// Entry point to bundle instead of the workspace's `main`.
        #[arg(long, value_name = "PATH", help = "Entry point override")]
        entry: Option<PathBuf>,
        /// Workspaces to keep external instead of inlining (repeatable).
        #[arg(
            long = "external",
            action = clap::ArgAction::Append,
            value_name = "NAME",
            help = "Keep a workspace external instead of inlining it (repeatable)"
        )]
        externals: Vec<String>,
        /// How to resolve version range conflicts.
        #[arg(long, value_name = "POLICY", help = "Conflict policy: first, warn, or overwrite")]
        conflicts: Option<ConflictPolicy>,
        /// Directory to write `package.json` into.
        #[arg(long, value_name = "DIR", help = "Write the manifest to DIR/package.json")]
        out_dir: Option<PathBuf>,
    },
    /// Print the external packages of a workspace.
    #[command(about = "Print the external packages of a workspace, one per line")]
    Externals {
        /// Workspace to inspect.
        #[arg(value_name = "NAME")]
        name: String,
        /// Workspaces to keep external instead of inlining (repeatable).
        #[arg(
            long = "external",
            action = clap::ArgAction::Append,
            value_name = "NAME",
            help = "Keep a workspace external instead of inlining it (repeatable)"
        )]
        externals: Vec<String>,
    },
    /// List workspaces in build order.
    #[command(about = "List workspaces with dependencies first")]
    List,
}

/// Parse command line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
