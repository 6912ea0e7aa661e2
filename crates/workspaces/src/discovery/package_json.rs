//! Workspace metadata derived from the root `package.json` `workspaces` field.
//!
//! Produces the same shape as `yarn workspaces info` without invoking a
//! package manager, which makes it usable for npm and Bun repositories and in
//! environments where yarn is not installed.

use crate::core::traits::WorkspaceMetadataProvider;
use crate::core::types::{PackageDescriptor, WorkspaceInfo, WorkspaceInfos};
use crate::discovery::{MANIFEST_NAME, read_json_file, resolve_glob_patterns};
use crate::error::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Discovers workspaces by expanding the root manifest's `workspaces` globs.
///
/// Handles both the array format and the object format (with a `packages`
/// key). Member directories without a readable, named `package.json` are
/// skipped. Workspaces are reported in name order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonWorkspacesProvider;

#[derive(Deserialize)]
struct RootManifest {
    workspaces: Option<WorkspacesField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    Array(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl WorkspacesField {
    fn into_patterns(self) -> Vec<String> {
        match self {
            Self::Array(patterns) | Self::Object { packages: patterns } => patterns,
        }
    }
}

struct Member {
    location: PathBuf,
    descriptor: PackageDescriptor,
}

impl PackageJsonWorkspacesProvider {
    /// Discovers workspaces synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWorkspaceConfig`] if the root manifest has no
    /// `workspaces` field or two members share a name, and I/O errors from
    /// reading manifests.
    pub fn discover(root: &Path) -> Result<WorkspaceInfos> {
        let root_manifest_path = root.join(MANIFEST_NAME);
        let root_manifest: RootManifest = read_json_file(&root_manifest_path)?;
        let patterns = root_manifest
            .workspaces
            .ok_or_else(|| Error::InvalidWorkspaceConfig {
                path: root_manifest_path.clone(),
                message: "no `workspaces` field is declared".to_string(),
            })?
            .into_patterns();

        let mut members: IndexMap<String, Member> = IndexMap::new();
        for path in resolve_glob_patterns(root, &patterns, &[])? {
            let Some(descriptor) = read_member(&path)? else {
                continue;
            };
            let Some(name) = descriptor.name.clone() else {
                continue;
            };
            let location = relative_location(root, &path);
            if let Some(existing) = members.get(&name) {
                return Err(Error::InvalidWorkspaceConfig {
                    path: root_manifest_path,
                    message: format!(
                        "workspace name '{name}' is used by both {} and {}",
                        existing.location.display(),
                        location.display()
                    ),
                });
            }
            members.insert(
                name,
                Member {
                    location,
                    descriptor,
                },
            );
        }

        members.sort_keys();
        let infos = members
            .iter()
            .map(|(name, member)| (name.clone(), workspace_info(member, &members)))
            .collect::<WorkspaceInfos>();

        tracing::debug!(workspaces = infos.len(), "Discovered workspaces from package.json");
        Ok(infos)
    }
}

#[async_trait]
impl WorkspaceMetadataProvider for PackageJsonWorkspacesProvider {
    fn name(&self) -> &'static str {
        "package-json"
    }

    async fn workspaces(&self, root: &Path) -> Result<WorkspaceInfos> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::discover(&root))
            .await
            .map_err(|e| Error::MetadataCommandFailed {
                command: "package.json discovery".to_string(),
                message: e.to_string(),
            })?
    }
}

/// Reads a member manifest, returning `None` when it is absent or unparseable.
fn read_member(path: &Path) -> Result<Option<PackageDescriptor>> {
    let manifest_path = path.join(MANIFEST_NAME);
    if !manifest_path.is_file() {
        return Ok(None);
    }
    match read_json_file::<PackageDescriptor>(&manifest_path) {
        Ok(descriptor) => Ok(Some(descriptor)),
        Err(Error::Json { .. }) => {
            tracing::warn!(path = %manifest_path.display(), "Skipping unparseable workspace manifest");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn relative_location(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn workspace_info(member: &Member, members: &IndexMap<String, Member>) -> WorkspaceInfo {
    let mut info = WorkspaceInfo::new(member.location.clone());
    let declared = member
        .descriptor
        .dependencies
        .iter()
        .chain(member.descriptor.dev_dependencies.iter());

    for (dep, range) in declared {
        let Some(target) = members.get(dep) else {
            continue;
        };
        if info.workspace_dependencies.contains(dep)
            || info.mismatched_workspace_dependencies.contains(dep)
        {
            continue;
        }
        if range_accepts(range, target.descriptor.version.as_deref()) {
            info.workspace_dependencies.push(dep.clone());
        } else {
            info.mismatched_workspace_dependencies.push(dep.clone());
        }
    }
    info.workspace_dependencies.sort();
    info.mismatched_workspace_dependencies.sort();
    info
}

/// Returns `true` if `range` is satisfied by the local workspace `version`.
///
/// A bare version means exactly that version. Protocol ranges
/// (`workspace:`, `file:`, `link:`) and ranges that cannot be parsed are
/// accepted.
fn range_accepts(range: &str, version: Option<&str>) -> bool {
    let range = range.strip_prefix("workspace:").unwrap_or(range).trim();
    if range.is_empty() || range == "*" || range.contains(':') {
        return true;
    }
    let Some(version) = version.and_then(|v| semver::Version::parse(v).ok()) else {
        return true;
    };

    if let Ok(exact) = semver::Version::parse(range.trim_start_matches('=')) {
        return exact == version;
    }
    match semver::VersionReq::parse(range) {
        Ok(req) => req.matches(&version),
        Err(e) => {
            tracing::debug!(range, error = %e, "Unparseable workspace range treated as matching");
            true
        }
    }
}
