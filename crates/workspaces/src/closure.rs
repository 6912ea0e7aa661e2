//! Transitive closure of a workspace's external dependencies.
//!
//! Starting at a root workspace, every declared dependency that resolves to
//! another workspace is replaced by that workspace's own dependencies, and
//! every dependency that resolves to an external package is kept as a leaf.
//! Names in the exclusion set are kept as leaves even when they are
//! workspaces, which lets callers cut the internal graph at a workspace that
//! is published separately.

use crate::core::types::{Dependency, WorkspaceNode};
use crate::error::{Error, Result};
use crate::graph::ProjectGraph;
use std::collections::{HashMap, HashSet};

/// Collects the leaf dependencies reachable from `root_name`.
///
/// Leaves are returned in depth-first, pre-order, declaration order and may
/// contain duplicates; see [`crate::dedupe`] for collapsing them. A workspace
/// reached along several paths is expanded once and its leaves are reused,
/// so the output still grows with the number of paths.
///
/// # Errors
///
/// - [`Error::WorkspaceNotFound`] if `root_name` is not a workspace.
/// - [`Error::CyclicWorkspaceDependency`] if expansion revisits a workspace
///   already on the current path.
#[tracing::instrument(skip(graph, excluded), fields(excluded = excluded.len()))]
pub fn collect(
    graph: &ProjectGraph,
    root_name: &str,
    excluded: &HashSet<String>,
) -> Result<Vec<Dependency>> {
    let root = graph
        .lookup(root_name)
        .ok_or_else(|| Error::workspace_not_found(root_name))?;

    let mut walker = Walker {
        graph,
        excluded,
        path: vec![root.name()],
        leaves: Vec::new(),
        expanded: HashMap::new(),
    };
    walker.expand(root)?;

    tracing::debug!(
        root = root_name,
        leaves = walker.leaves.len(),
        "Collected workspace closure"
    );
    Ok(walker.leaves)
}

struct Walker<'a> {
    graph: &'a ProjectGraph,
    excluded: &'a HashSet<String>,
    /// Workspaces currently being expanded, root first.
    path: Vec<&'a str>,
    leaves: Vec<Dependency>,
    /// Leaves of every workspace whose expansion has completed.
    expanded: HashMap<&'a str, Vec<Dependency>>,
}

impl<'a> Walker<'a> {
    fn expand(&mut self, workspace: &'a WorkspaceNode) -> Result<()> {
        for (name, range) in &workspace.declared_dependencies {
            if self.excluded.contains(name) {
                tracing::trace!(dependency = %name, origin = workspace.name(), "Excluded dependency kept as leaf");
                self.leaves
                    .push(Dependency::new(name, range, workspace.name()));
                continue;
            }

            let Some(child) = self.graph.lookup(name) else {
                self.leaves
                    .push(Dependency::new(name, range, workspace.name()));
                continue;
            };

            if self.path.contains(&child.name()) {
                let mut cycle: Vec<String> = self
                    .path
                    .iter()
                    .skip_while(|visited| **visited != child.name())
                    .map(|visited| (*visited).to_string())
                    .collect();
                cycle.push(child.name().to_string());
                return Err(Error::CyclicWorkspaceDependency { cycle });
            }

            if workspace.mismatched_dependency_names.contains(name) {
                tracing::warn!(
                    workspace = workspace.name(),
                    dependency = %name,
                    range = %range,
                    version = child.metadata.version.as_deref().unwrap_or("<none>"),
                    "Declared range does not match the local workspace version; inlining the local workspace"
                );
            }

            if let Some(cached) = self.expanded.get(child.name()) {
                self.leaves.extend_from_slice(cached);
                continue;
            }

            let start = self.leaves.len();
            self.path.push(child.name());
            self.expand(child)?;
            self.path.pop();
            self.expanded
                .insert(child.name(), self.leaves[start..].to_vec());
        }
        Ok(())
    }
}
