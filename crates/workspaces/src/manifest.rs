//! Building the distributable manifest of a single workspace.
//!
//! The flattened manifest describes the *bundle output*, not the source tree:
//! its `main` is the compiled bundle file, its dependencies are the external
//! closure of the workspace, and it never carries development dependencies.

use crate::closure::collect;
use crate::core::types::{Dependency, WorkspaceNode};
use crate::dedupe::{ConflictPolicy, ExternalSet, dedupe};
use crate::error::{Error, Result};
use crate::graph::ProjectGraph;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// File name of the compiled bundle the manifest's `main` points at.
pub const BUNDLE_MAIN: &str = "index.js";

/// Range used for an explicit external workspace that declares no version.
const UNVERSIONED_RANGE: &str = "*";

/// Caller inputs for [`flatten`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Entry point to use instead of the workspace's declared `main`.
    pub entry: Option<PathBuf>,
    /// Workspaces to treat as external packages instead of inlining them.
    pub externals: Vec<String>,
    /// Tie-break for packages reached with different ranges.
    pub conflict_policy: ConflictPolicy,
}

/// The flattened, self-contained descriptor of one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedManifest {
    entry: PathBuf,
    name: Option<String>,
    version: Option<String>,
    license: Option<String>,
    dependencies: ExternalSet,
    dev_dependencies: ExternalSet,
}

/// `package.json` document written next to the bundle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<&'a str>,
    main: &'a str,
    dependencies: &'a ExternalSet,
    dev_dependencies: &'a ExternalSet,
}

impl FlattenedManifest {
    /// Assembles a manifest from already-resolved parts.
    #[must_use]
    pub fn new(entry: PathBuf, root: &WorkspaceNode, dependencies: ExternalSet) -> Self {
        Self {
            entry,
            name: root.metadata.name.clone(),
            version: root.metadata.version.clone(),
            license: root.metadata.license.clone(),
            dependencies,
            dev_dependencies: ExternalSet::new(),
        }
    }

    /// Resolved source entry point to hand to the bundler.
    #[must_use]
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Package version, when the workspace declares one.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// License, when the workspace declares one.
    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    /// The manifest's `main`, always [`BUNDLE_MAIN`].
    #[must_use]
    pub fn main(&self) -> &str {
        BUNDLE_MAIN
    }

    /// External dependencies of the bundle.
    #[must_use]
    pub fn dependencies(&self) -> &ExternalSet {
        &self.dependencies
    }

    /// Development dependencies; always empty.
    #[must_use]
    pub fn dev_dependencies(&self) -> &ExternalSet {
        &self.dev_dependencies
    }

    /// Package names the bundler must not inline.
    #[must_use]
    pub fn externals(&self) -> Vec<&str> {
        self.dependencies.names().collect()
    }

    /// Borrowed `package.json` view of this manifest.
    #[must_use]
    pub fn package_json(&self) -> PackageJson<'_> {
        PackageJson {
            name: self.name(),
            version: self.version(),
            license: self.license(),
            main: self.main(),
            dependencies: &self.dependencies,
            dev_dependencies: &self.dev_dependencies,
        }
    }

    /// `package.json` document as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_package_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.package_json())?)
    }

    /// `package.json` document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.package_json())?)
    }
}

/// Flattens `root_name` into a distributable manifest.
///
/// # Errors
///
/// - [`Error::WorkspaceNotFound`] if the root or any explicit external is not a workspace.
/// - [`Error::NoEntryPoint`] if no entry override is given and the root declares no `main`.
/// - [`Error::CyclicWorkspaceDependency`] if the internal graph has a cycle on the walk.
#[tracing::instrument(skip(graph, options), fields(externals = options.externals.len()))]
pub fn flatten(
    graph: &ProjectGraph,
    root_name: &str,
    options: &FlattenOptions,
) -> Result<FlattenedManifest> {
    let root = graph
        .lookup(root_name)
        .ok_or_else(|| Error::workspace_not_found(root_name))?;
    let forced = lookup_forced(graph, root_name, &options.externals)?;
    let entry = resolve_entry(graph, root, options.entry.as_deref())?;

    let dependencies = closure_with(graph, root_name, &forced, options.conflict_policy)?;
    tracing::debug!(
        root = root_name,
        entry = %entry.display(),
        dependencies = dependencies.len(),
        "Flattened workspace manifest"
    );

    Ok(FlattenedManifest::new(entry, root, dependencies))
}

/// Computes only the external dependency set [`flatten`] would emit.
///
/// Unlike [`flatten`], this does not need an entry point.
///
/// # Errors
///
/// - [`Error::WorkspaceNotFound`] if the root or any explicit external is not a workspace.
/// - [`Error::CyclicWorkspaceDependency`] if the internal graph has a cycle on the walk.
pub fn external_dependencies(
    graph: &ProjectGraph,
    root_name: &str,
    externals: &[String],
    policy: ConflictPolicy,
) -> Result<ExternalSet> {
    if !graph.is_workspace(root_name) {
        return Err(Error::workspace_not_found(root_name));
    }
    let forced = lookup_forced(graph, root_name, externals)?;
    closure_with(graph, root_name, &forced, policy)
}

/// Resolves explicit externals to workspaces, skipping the root itself.
fn lookup_forced<'a>(
    graph: &'a ProjectGraph,
    root_name: &str,
    names: &[String],
) -> Result<Vec<&'a WorkspaceNode>> {
    let mut forced = Vec::with_capacity(names.len());
    for name in names {
        let workspace = graph
            .lookup(name)
            .ok_or_else(|| Error::workspace_not_found(name))?;
        if name == root_name {
            tracing::warn!(workspace = root_name, "Ignoring the root as its own external");
            continue;
        }
        forced.push(workspace);
    }
    Ok(forced)
}

/// Walks `root_name` with `forced` excluded, then lists each forced
/// workspace at its own version.
fn closure_with(
    graph: &ProjectGraph,
    root_name: &str,
    forced: &[&WorkspaceNode],
    policy: ConflictPolicy,
) -> Result<ExternalSet> {
    let excluded: HashSet<String> = forced.iter().map(|w| w.name().to_string()).collect();
    let mut deps = collect(graph, root_name, &excluded)?;
    deps.extend(forced.iter().map(|workspace| {
        Dependency::new(
            workspace.name(),
            workspace
                .metadata
                .version
                .as_deref()
                .unwrap_or(UNVERSIONED_RANGE),
            root_name,
        )
    }));
    Ok(dedupe(&deps, policy))
}

fn resolve_entry(
    graph: &ProjectGraph,
    root: &WorkspaceNode,
    entry_override: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(entry) = entry_override {
        return Ok(entry.to_path_buf());
    }
    let main = root
        .entry_point
        .as_deref()
        .ok_or_else(|| Error::NoEntryPoint {
            name: root.name().to_string(),
        })?;
    Ok(normalize(
        &graph.root().join(&root.reference.location).join(main),
    ))
}

/// Lexically removes `.` components and folds `..` into their parent.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
