//! Locating a project and the collaborators that describe its workspaces.
//!
//! This module provides:
//! - [`find_project_root`] to locate the monorepo root from any directory inside it
//! - [`YarnWorkspacesProvider`] for metadata from `yarn workspaces info`
//! - [`PackageJsonWorkspacesProvider`] for metadata from the root `package.json` globs
//! - [`FsDescriptorReader`] for reading each workspace's `package.json`
//! - [`InMemoryProject`] for fixed data
//!
//! # Usage
//!
//! ```rust,ignore
//! use manyfest_workspaces::discovery::{find_project_root, FsDescriptorReader, YarnWorkspacesProvider};
//! use manyfest_workspaces::load_project;
//!
//! let root = find_project_root(&std::env::current_dir()?)?;
//! let graph = load_project(&root, &YarnWorkspacesProvider::default(), &FsDescriptorReader).await?;
//! ```

use crate::core::traits::DescriptorReader;
use crate::core::types::{PackageDescriptor, WorkspaceInfo};
use crate::error::{Error, Result};
use crate::manifest::normalize;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub mod memory;

#[cfg(feature = "discovery-package-json")]
pub mod package_json;

#[cfg(feature = "provider-yarn")]
pub mod yarn;

pub use memory::InMemoryProject;

#[cfg(feature = "discovery-package-json")]
pub use package_json::PackageJsonWorkspacesProvider;

#[cfg(feature = "provider-yarn")]
pub use yarn::YarnWorkspacesProvider;

/// Name of the package descriptor file in every workspace.
pub const MANIFEST_NAME: &str = "package.json";

/// Finds the nearest directory at or above `start` whose `package.json`
/// declares `workspaces`.
///
/// Manifests that cannot be parsed are skipped so a broken nested package
/// does not hide the real root. A relative `start` is taken relative to the
/// current directory.
///
/// # Errors
///
/// Returns [`Error::ProjectRootNotFound`] if no ancestor qualifies, or
/// [`Error::Io`] if the current directory cannot be read.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    #[derive(serde::Deserialize)]
    struct RootManifest {
        workspaces: Option<serde_json::Value>,
    }

    let absolute = if start.is_absolute() {
        normalize(start)
    } else {
        let cwd = std::env::current_dir().map_err(|source| Error::Io {
            source,
            path: None,
            operation: "reading the current directory".to_string(),
        })?;
        absolute_start(&cwd, start)
    };

    for dir in absolute.ancestors() {
        let manifest = dir.join(MANIFEST_NAME);
        if !manifest.is_file() {
            continue;
        }
        match read_json_file::<RootManifest>(&manifest) {
            Ok(RootManifest {
                workspaces: Some(_),
            }) => {
                tracing::debug!(root = %dir.display(), "Found project root");
                return Ok(dir.to_path_buf());
            }
            Ok(_) | Err(Error::Json { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    Err(Error::ProjectRootNotFound {
        path: start.to_path_buf(),
    })
}

fn absolute_start(cwd: &Path, start: &Path) -> PathBuf {
    normalize(&cwd.join(start))
}

/// Drops the `./` prefixes and trailing `/` that npm and yarn accept.
#[cfg(feature = "discovery-package-json")]
fn clean_pattern(pattern: &str) -> &str {
    let mut pattern = pattern.trim_end_matches('/');
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern
}

/// Resolves glob patterns to find directories, handling exclusions.
///
/// # Arguments
///
/// * `root` - The root directory to resolve patterns from.
/// * `patterns` - List of glob patterns to match (e.g., "packages/*").
/// * `exclusions` - List of glob patterns to exclude.
///   Patterns starting with "!" in the `patterns` list are also treated as exclusions.
///
/// # Returns
///
/// A sorted list of unique, absolute paths (rooted under `root`) that match
/// the patterns and are not excluded. `node_modules`, `.git`, `target` and
/// `dist` are never entered.
///
/// # Errors
///
/// Returns [`Error::InvalidWorkspaceConfig`] if a pattern is not a valid glob.
#[cfg(feature = "discovery-package-json")]
pub fn resolve_glob_patterns(
    root: &Path,
    patterns: &[String],
    exclusions: &[String],
) -> Result<Vec<PathBuf>> {
    use glob::{MatchOptions, Pattern};
    use std::collections::BTreeSet;
    use walkdir::WalkDir;

    const PRUNED: [&str; 4] = ["node_modules", ".git", "target", "dist"];

    let compile = |pattern: &str| {
        Pattern::new(pattern).map_err(|e| Error::InvalidWorkspaceConfig {
            path: root.join(MANIFEST_NAME),
            message: format!("invalid workspace pattern '{pattern}': {e}"),
        })
    };

    let mut inclusion_patterns = Vec::new();
    let mut exclusion_patterns = Vec::new();
    for p in exclusions {
        exclusion_patterns.push(compile(clean_pattern(p))?);
    }
    for p in patterns {
        if let Some(stripped) = p.strip_prefix('!') {
            exclusion_patterns.push(compile(clean_pattern(stripped))?);
        } else {
            inclusion_patterns.push(compile(clean_pattern(p))?);
        }
    }

    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    let mut matched_paths = BTreeSet::new();
    let walker = WalkDir::new(root).follow_links(false);

    for entry in walker
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            e.depth() == 0 || !PRUNED.contains(&name)
        })
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            continue;
        }

        let path = entry.path();
        let Ok(rel_path) = path.strip_prefix(root) else {
            continue;
        };

        if exclusion_patterns
            .iter()
            .any(|p| p.matches_path_with(rel_path, options))
        {
            continue;
        }
        if inclusion_patterns
            .iter()
            .any(|p| p.matches_path_with(rel_path, options))
        {
            matched_paths.insert(path.to_path_buf());
        }
    }

    Ok(matched_paths.into_iter().collect())
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed as valid JSON.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io {
        source: e,
        path: Some(path.to_path_buf()),
        operation: "reading json file".to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| Error::Json {
        source: e,
        path: Some(path.to_path_buf()),
    })
}

/// Reads `<root>/<location>/package.json` from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDescriptorReader;

#[async_trait]
impl DescriptorReader for FsDescriptorReader {
    async fn read(
        &self,
        root: &Path,
        name: &str,
        info: &WorkspaceInfo,
    ) -> Result<PackageDescriptor> {
        let path = root.join(&info.location).join(MANIFEST_NAME);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::malformed(
                    name,
                    format!("no package descriptor at {}", path.display()),
                ));
            }
            Err(e) => {
                return Err(Error::Io {
                    source: e,
                    path: Some(path),
                    operation: "reading package descriptor".to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| Error::Json {
            source: e,
            path: Some(path),
        })
    }
}
