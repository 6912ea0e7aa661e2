//! Assembles a [`ProjectGraph`] from its collaborators.

use crate::core::traits::{DescriptorReader, WorkspaceMetadataProvider};
use crate::core::types::{PackageDescriptor, WorkspaceInfos};
use crate::error::Result;
use crate::graph::ProjectGraph;
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Options controlling which reported workspaces enter the graph.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Workspace names to leave out of the project entirely, such as the
    /// bundling tool's own package.
    ///
    /// Other workspaces that depend on an ignored one see it as an external
    /// package.
    pub ignore: HashSet<String>,
}

impl LoadOptions {
    /// Adds a workspace name to the ignore list.
    #[must_use]
    pub fn ignoring(mut self, name: impl Into<String>) -> Self {
        self.ignore.insert(name.into());
        self
    }
}

/// Loads every workspace of the project at `root`.
///
/// Asks `provider` for the workspace map, then reads all descriptors
/// concurrently through `reader`.
///
/// # Errors
///
/// Propagates provider and reader failures, and returns
/// [`crate::Error::MalformedWorkspaceData`] if the two disagree.
pub async fn load_project(
    root: &Path,
    provider: &dyn WorkspaceMetadataProvider,
    reader: &dyn DescriptorReader,
) -> Result<ProjectGraph> {
    load_project_with(root, provider, reader, &LoadOptions::default()).await
}

/// Like [`load_project`], honouring `options`.
///
/// # Errors
///
/// See [`load_project`].
#[tracing::instrument(skip(provider, reader, options), fields(provider = provider.name()))]
pub async fn load_project_with(
    root: &Path,
    provider: &dyn WorkspaceMetadataProvider,
    reader: &dyn DescriptorReader,
    options: &LoadOptions,
) -> Result<ProjectGraph> {
    let reported = provider.workspaces(root).await?;
    let infos = apply_ignore(reported, &options.ignore);
    tracing::debug!(workspaces = infos.len(), "Loaded workspace metadata");

    let reads = infos.iter().map(|(name, info)| async move {
        let descriptor = reader.read(root, name, info).await?;
        Ok::<(String, PackageDescriptor), crate::Error>((name.clone(), descriptor))
    });
    let descriptors: HashMap<String, PackageDescriptor> =
        try_join_all(reads).await?.into_iter().collect();

    ProjectGraph::build(root, &infos, &descriptors)
}

/// Drops ignored workspaces and every reference to them.
fn apply_ignore(mut infos: WorkspaceInfos, ignore: &HashSet<String>) -> WorkspaceInfos {
    if ignore.is_empty() {
        return infos;
    }
    infos.retain(|name, _| !ignore.contains(name));
    for info in infos.values_mut() {
        info.workspace_dependencies.retain(|dep| !ignore.contains(dep));
        info.mismatched_workspace_dependencies
            .retain(|dep| !ignore.contains(dep));
    }
    infos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::closure::collect;
    use crate::test_fixtures::ProjectBuilder;

    #[tokio::test]
    async fn test_load_project_reads_every_workspace() {
        let project = ProjectBuilder::new()
            .workspace("app", &[("lib", "1.0.0"), ("express", "^4.0.0")])
            .workspace("lib", &[("lodash", "^4.17.0")])
            .into_memory();

        let graph = load_project(Path::new("/repo"), &project, &project)
            .await
            .unwrap();

        assert_eq!(graph.workspace_names().collect::<Vec<_>>(), vec!["app", "lib"]);
        assert_eq!(graph.root(), Path::new("/repo"));
        assert!(graph.lookup("app").unwrap().internal_dependency_names.contains("lib"));
    }

    #[tokio::test]
    async fn test_ignored_workspace_becomes_external() {
        let project = ProjectBuilder::new()
            .workspace("app", &[("builder", "1.0.0"), ("lib", "1.0.0")])
            .workspace("builder", &[("webpack", "^5.0.0")])
            .workspace("lib", &[])
            .into_memory();
        let options = LoadOptions::default().ignoring("builder");

        let graph = load_project_with(Path::new("/repo"), &project, &project, &options)
            .await
            .unwrap();

        assert!(!graph.is_workspace("builder"));
        let deps = collect(&graph, "app", &HashSet::new()).unwrap();
        let names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["builder"]);
    }

    #[tokio::test]
    async fn test_reader_failure_propagates() {
        let project = crate::discovery::InMemoryProject::default().with_workspace(
            "app",
            crate::WorkspaceInfo::new("packages/app"),
            PackageDescriptor::default(),
        );
        let empty = crate::discovery::InMemoryProject::default();

        let result = load_project(Path::new("/repo"), &project, &empty).await;

        assert!(matches!(result, Err(Error::MalformedWorkspaceData { .. })));
    }
}
