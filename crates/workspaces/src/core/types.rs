//! Core types for representing workspaces, descriptors, and dependencies.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Type alias for version requirement strings (e.g. `^4.17.0`, `workspace:*`).
///
/// Ranges are passed through verbatim; no semver merging is performed on them.
pub type VersionReq = String;

/// Workspace metadata as reported by the package manager, keyed by workspace name.
pub type WorkspaceInfos = IndexMap<String, WorkspaceInfo>;

/// Identity of a package inside the monorepo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceRef {
    /// Unique package name, scoped or unscoped.
    pub name: String,

    /// Path relative to the project root.
    pub location: PathBuf,
}

impl WorkspaceRef {
    /// Creates a new workspace reference.
    #[must_use]
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    /// Returns the name with any leading `@scope/` removed.
    ///
    /// All local workspaces are assumed to share one scope, so stripping it
    /// introduces no conflicts that did not already exist.
    ///
    /// # Example
    ///
    /// ```
    /// use manyfest_workspaces::WorkspaceRef;
    ///
    /// assert_eq!(WorkspaceRef::new("@acme/app", "apps/app").path_safe_name(), "app");
    /// assert_eq!(WorkspaceRef::new("lib", "packages/lib").path_safe_name(), "lib");
    /// ```
    #[must_use]
    pub fn path_safe_name(&self) -> &str {
        match self.name.strip_prefix('@') {
            Some(scoped) => scoped.split_once('/').map_or(self.name.as_str(), |(_, name)| name),
            None => &self.name,
        }
    }
}

/// A single entry of `yarn workspaces info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    /// Path of the workspace relative to the project root.
    pub location: PathBuf,

    /// Names of dependencies satisfied by other workspaces.
    #[serde(default)]
    pub workspace_dependencies: Vec<String>,

    /// Names of workspace dependencies whose declared range does not match
    /// the local workspace version.
    #[serde(default)]
    pub mismatched_workspace_dependencies: Vec<String>,
}

impl WorkspaceInfo {
    /// Creates an entry with no workspace dependencies.
    #[must_use]
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }
}

/// The fields of a `package.json` the resolver reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    /// Package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Package version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// SPDX license expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Source entry point, relative to the package directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    /// Runtime dependencies in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: IndexMap<String, VersionReq>,

    /// Development dependencies in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dev_dependencies: IndexMap<String, VersionReq>,
}

/// Pass-through descriptor fields copied into a flattened manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMetadata {
    /// Package name as written in the descriptor.
    pub name: Option<String>,
    /// Package version.
    pub version: Option<String>,
    /// SPDX license expression.
    pub license: Option<String>,
}

/// A workspace's resolved data. Immutable once the graph is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceNode {
    /// Identity of the workspace.
    pub reference: WorkspaceRef,

    /// Declared runtime dependencies; order is significant for tie-breaks.
    pub declared_dependencies: IndexMap<String, VersionReq>,

    /// Declared dependencies known to be other workspaces.
    pub internal_dependency_names: BTreeSet<String>,

    /// Internal dependencies whose range does not match the workspace version.
    pub mismatched_dependency_names: BTreeSet<String>,

    /// Declared entry point, relative to the workspace location.
    pub entry_point: Option<PathBuf>,

    /// Descriptor fields passed through to the flattened manifest.
    pub metadata: WorkspaceMetadata,
}

impl WorkspaceNode {
    /// Returns the workspace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.reference.name
    }
}

/// A dependency edge reached during the closure walk, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Package name.
    pub name: String,
    /// Declared version range.
    pub version_req: VersionReq,
    /// Workspace that declared the dependency.
    pub origin: String,
}

impl Dependency {
    /// Creates a new dependency.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version_req: impl Into<VersionReq>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version_req: version_req.into(),
            origin: origin.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_safe_name_strips_scope() {
        let reference = WorkspaceRef::new("@daveth/builder", "builder");
        assert_eq!(reference.path_safe_name(), "builder");
    }

    #[test]
    fn test_path_safe_name_without_slash_is_untouched() {
        let reference = WorkspaceRef::new("@odd", "odd");
        assert_eq!(reference.path_safe_name(), "@odd");
    }

    #[test]
    fn test_workspace_info_deserializes_yarn_shape() {
        let info: WorkspaceInfo = serde_json::from_str(
            r#"{
                "location": "components/app",
                "workspaceDependencies": ["@acme/lib"],
                "mismatchedWorkspaceDependencies": []
            }"#,
        )
        .unwrap();

        assert_eq!(info.location, PathBuf::from("components/app"));
        assert_eq!(info.workspace_dependencies, vec!["@acme/lib".to_string()]);
        assert!(info.mismatched_workspace_dependencies.is_empty());
    }

    #[test]
    fn test_descriptor_preserves_declaration_order() {
        let descriptor: PackageDescriptor = serde_json::from_str(
            r#"{
                "name": "app",
                "dependencies": { "zod": "^3.0.0", "express": "^4.0.0", "lib": "1.0.0" },
                "scripts": { "build": "tsc" }
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = descriptor.dependencies.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zod", "express", "lib"]);
        assert!(descriptor.dev_dependencies.is_empty());
        assert_eq!(descriptor.main, None);
    }
}
