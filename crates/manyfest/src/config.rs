//! `manyfest.toml` project configuration.
//!
//! ```toml
//! ignore = ["@acme/build-tools"]
//!
//! [defaults]
//! conflicts = "warn"
//! out-dir = "dist/{name}"
//!
//! [workspaces."@acme/app"]
//! externals = ["@acme/plugin-api"]
//! entry = "packages/app/src/server.ts"
//! ```
//!
//! Settings resolve per workspace: command-line flags win over the
//! workspace's table, which wins over `[defaults]`. Externals from every
//! layer are combined. Workspaces listed in `ignore` are left out of the
//! project and seen as external packages.

use crate::cli::CliError;
use indexmap::IndexMap;
use manyfest_workspaces::ConflictPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "manyfest.toml";

/// Per-workspace flatten settings; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Workspaces to keep external instead of inlining.
    #[serde(default)]
    pub externals: Vec<String>,
    /// Entry point override.
    pub entry: Option<PathBuf>,
    /// Version conflict policy.
    pub conflicts: Option<ConflictPolicy>,
    /// Directory the flattened `package.json` is written to; `{name}` expands
    /// to the unscoped workspace name.
    pub out_dir: Option<PathBuf>,
}

/// Parsed `manyfest.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManyfestConfig {
    /// Workspaces to leave out of the project.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Settings applied to every workspace.
    #[serde(default)]
    pub defaults: WorkspaceSettings,
    /// Settings for individual workspaces, keyed by package name.
    #[serde(default)]
    pub workspaces: IndexMap<String, WorkspaceSettings>,
}

/// Settings for one flatten run after all layers are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// Workspaces to keep external, without duplicates.
    pub externals: Vec<String>,
    /// Entry point override.
    pub entry: Option<PathBuf>,
    /// Version conflict policy.
    pub conflicts: ConflictPolicy,
    /// Output directory, if any.
    pub out_dir: Option<PathBuf>,
}

impl ManyfestConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming `path` if the TOML is invalid.
    pub fn parse(content: &str, path: &Path) -> Result<Self, CliError> {
        toml::from_str(content).map_err(|e| {
            CliError::config_with_help(
                format!("Invalid configuration in {}: {e}", path.display()),
                "See the manyfest.toml reference for the supported keys",
            )
        })
    }

    /// Loads configuration.
    ///
    /// An `explicit` path must exist. Otherwise `manyfest.toml` in `root` is
    /// used when present, and an empty configuration when not.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, CliError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    tracing::debug!(root = %root.display(), "No manyfest.toml found");
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            CliError::config(format!(
                "Failed to read configuration {}: {e}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Self::parse(&content, &path)
    }

    /// Merges `[defaults]`, the workspace table for `name`, and `overrides`.
    #[must_use]
    pub fn resolve(&self, name: &str, overrides: &WorkspaceSettings) -> ResolvedSettings {
        let layers = [Some(&self.defaults), self.workspaces.get(name), Some(overrides)];
        let mut resolved = ResolvedSettings::default();

        for layer in layers.into_iter().flatten() {
            for external in &layer.externals {
                if !resolved.externals.contains(external) {
                    resolved.externals.push(external.clone());
                }
            }
            if let Some(entry) = &layer.entry {
                resolved.entry = Some(entry.clone());
            }
            if let Some(conflicts) = layer.conflicts {
                resolved.conflicts = conflicts;
            }
            if let Some(out_dir) = &layer.out_dir {
                resolved.out_dir = Some(out_dir.clone());
            }
        }

        resolved
    }
}
