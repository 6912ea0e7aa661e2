//! Command implementations.
//!
//! Every command loads the project once through [`Context::load`] and returns
//! the text to print on stdout.

pub mod externals;
pub mod flatten;
pub mod list;

use crate::cli::{Cli, CliError, Commands, MetadataSource};
use crate::config::{ManyfestConfig, WorkspaceSettings};
use manyfest_workspaces::{
    FsDescriptorReader, LoadOptions, PackageJsonWorkspacesProvider, ProjectGraph,
    WorkspaceMetadataProvider, YarnWorkspacesProvider, find_project_root, load_project_with,
};
use std::path::{Path, PathBuf};

/// A loaded project and its configuration.
#[derive(Debug)]
pub struct Context {
    /// Directory the command was started from.
    pub cwd: PathBuf,
    /// Project root.
    pub root: PathBuf,
    /// All workspaces of the project.
    pub graph: ProjectGraph,
    /// Parsed `manyfest.toml`, or defaults.
    pub config: ManyfestConfig,
}

impl Context {
    /// Locates the project root from `cwd`, then loads its configuration and workspaces.
    ///
    /// Workspaces named in `ignore` or in the configuration's `ignore` list are
    /// left out of the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is found, the configuration is invalid, or
    /// the workspaces cannot be loaded.
    pub async fn load(
        cwd: &Path,
        metadata: MetadataSource,
        config_path: Option<&Path>,
        ignore: &[String],
    ) -> Result<Self, CliError> {
        let root = find_project_root(cwd)?;
        let config = ManyfestConfig::load(&root, config_path.map(|p| absolutize(cwd, p)).as_deref())?;

        let options = config
            .ignore
            .iter()
            .chain(ignore)
            .fold(LoadOptions::default(), |options, name| options.ignoring(name.clone()));
        let provider = provider_for(metadata);
        let graph =
            load_project_with(&root, provider.as_ref(), &FsDescriptorReader, &options).await?;
        tracing::info!(
            root = %root.display(),
            provider = provider.name(),
            workspaces = graph.len(),
            ignored = options.ignore.len(),
            "Loaded project"
        );

        Ok(Self {
            cwd: cwd.to_path_buf(),
            root,
            graph,
            config,
        })
    }
}

fn provider_for(metadata: MetadataSource) -> Box<dyn WorkspaceMetadataProvider> {
    match metadata {
        MetadataSource::Yarn => Box::new(YarnWorkspacesProvider::default()),
        MetadataSource::PackageJson => Box::new(PackageJsonWorkspacesProvider),
    }
}

/// Joins a relative `path` onto `base`; absolute paths are returned as is.
#[must_use]
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// The directory to start from: `-C` taken relative to `current`, or `current`.
fn resolve_cwd(current: &Path, requested: Option<&Path>) -> PathBuf {
    requested.map_or_else(|| current.to_path_buf(), |dir| absolutize(current, dir))
}

/// Runs the parsed command line and returns what to print on stdout.
///
/// # Errors
///
/// Returns the command's error, mapped for exit code reporting.
#[tracing::instrument(skip(cli), fields(correlation_id = %crate::tracing::correlation_id()))]
pub async fn execute(cli: &Cli) -> Result<String, CliError> {
    let current = std::env::current_dir().map_err(|e| {
        CliError::other_with_help(
            format!("Failed to read the current directory: {e}"),
            "Pass an absolute project directory with -C",
        )
    })?;
    let cwd = resolve_cwd(&current, cli.cwd.as_deref());
    let ctx = Context::load(&cwd, cli.metadata, cli.config.as_deref(), &cli.ignore).await?;

    match &cli.command {
        Commands::Flatten {
            names,
            all,
            entry,
            externals,
            conflicts,
            out_dir,
        } => {
            let overrides = WorkspaceSettings {
                externals: externals.clone(),
                entry: entry.as_deref().map(|p| absolutize(&ctx.cwd, p)),
                conflicts: *conflicts,
                out_dir: out_dir.as_deref().map(|p| absolutize(&ctx.cwd, p)),
            };
            let selection = if *all {
                flatten::Selection::All
            } else {
                flatten::Selection::Named(names)
            };
            flatten::run_many(&ctx, selection, &overrides)
        }
        Commands::Externals { name, externals } => {
            let overrides = WorkspaceSettings {
                externals: externals.clone(),
                ..WorkspaceSettings::default()
            };
            externals::run(&ctx, name, &overrides)
        }
        Commands::List => list::run(&ctx),
    }
}
