//! In-memory model of every workspace in a project.
//!
//! A [`ProjectGraph`] is built once per resolution from the metadata provider's
//! workspace map and the per-workspace package descriptors, and is read-only
//! afterwards. Its main job is answering "is this dependency another
//! workspace, or an external package?".

use crate::core::types::{
    PackageDescriptor, WorkspaceInfos, WorkspaceMetadata, WorkspaceNode, WorkspaceRef,
};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Immutable snapshot of a project's workspaces, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGraph {
    root: PathBuf,
    nodes: IndexMap<String, WorkspaceNode>,
}

impl ProjectGraph {
    /// Builds a graph from provider metadata and package descriptors.
    ///
    /// Workspaces keep the order in which the provider reported them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedWorkspaceData`] if a reported workspace has no
    /// descriptor, if a descriptor names a different package than the one the
    /// provider reported, or if an internal dependency names no known workspace.
    pub fn build(
        root: impl Into<PathBuf>,
        infos: &WorkspaceInfos,
        descriptors: &HashMap<String, PackageDescriptor>,
    ) -> Result<Self> {
        let mut nodes = IndexMap::with_capacity(infos.len());

        for (name, info) in infos {
            let descriptor = descriptors
                .get(name)
                .ok_or_else(|| Error::malformed(name, "no package descriptor was found"))?;

            if let Some(declared) = descriptor.name.as_deref() {
                if declared != name {
                    return Err(Error::malformed(
                        name,
                        format!("package descriptor declares the name '{declared}'"),
                    ));
                }
            }

            let mut internal = BTreeSet::new();
            let mut mismatched = BTreeSet::new();
            let reported = info
                .workspace_dependencies
                .iter()
                .map(|dep| (dep, false))
                .chain(
                    info.mismatched_workspace_dependencies
                        .iter()
                        .map(|dep| (dep, true)),
                );
            for (dep, is_mismatched) in reported {
                if !infos.contains_key(dep) {
                    return Err(Error::malformed(
                        name,
                        format!("workspace dependency '{dep}' is not a workspace of this project"),
                    ));
                }
                // devDependencies are reported too but never walked
                if !descriptor.dependencies.contains_key(dep) {
                    continue;
                }
                internal.insert(dep.clone());
                if is_mismatched {
                    mismatched.insert(dep.clone());
                }
            }

            let node = WorkspaceNode {
                reference: WorkspaceRef::new(name.clone(), info.location.clone()),
                declared_dependencies: descriptor.dependencies.clone(),
                internal_dependency_names: internal,
                mismatched_dependency_names: mismatched,
                entry_point: descriptor.main.as_ref().map(PathBuf::from),
                metadata: WorkspaceMetadata {
                    name: descriptor.name.clone(),
                    version: descriptor.version.clone(),
                    license: descriptor.license.clone(),
                },
            };
            nodes.insert(name.clone(), node);
        }

        tracing::debug!(workspaces = nodes.len(), "Built project graph");

        Ok(Self {
            root: root.into(),
            nodes,
        })
    }

    /// Project root directory all workspace locations are relative to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Looks up a workspace by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&WorkspaceNode> {
        self.nodes.get(name)
    }

    /// Returns `true` if `name` is a workspace of this project.
    #[must_use]
    pub fn is_workspace(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Iterates workspace names in provider order.
    pub fn workspace_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Iterates workspaces in provider order.
    pub fn workspaces(&self) -> impl Iterator<Item = &WorkspaceNode> {
        self.nodes.values()
    }

    /// Number of workspaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the project has no workspaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the workspaces ordered so that every workspace comes after the
    /// workspaces it depends on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicWorkspaceDependency`] if the internal graph has a cycle.
    pub fn build_order(&self) -> Result<Vec<&WorkspaceNode>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        let indices: HashMap<&str, NodeIndex> = self
            .nodes
            .keys()
            .map(|name| (name.as_str(), graph.add_node(name.as_str())))
            .collect();

        for node in self.nodes.values() {
            let dependent = indices[node.name()];
            for dep in node.declared_dependencies.keys() {
                if let Some(&dependency) = indices.get(dep.as_str()) {
                    graph.add_edge(dependency, dependent, ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            let start = graph[cycle.node_id()];
            Error::CyclicWorkspaceDependency {
                cycle: self.cycle_through(start),
            }
        })?;

        Ok(order
            .into_iter()
            .filter_map(|index| self.nodes.get(graph[index]))
            .collect())
    }

    /// Finds a dependency path from `start` back to itself.
    fn cycle_through(&self, start: &str) -> Vec<String> {
        fn search<'a>(
            graph: &'a ProjectGraph,
            start: &str,
            current: &'a str,
            path: &mut Vec<&'a str>,
        ) -> bool {
            let Some(node) = graph.lookup(current) else {
                return false;
            };
            for dep in node.declared_dependencies.keys() {
                if dep == start {
                    path.push(dep);
                    return true;
                }
                if !graph.is_workspace(dep) || path.contains(&dep.as_str()) {
                    continue;
                }
                path.push(dep);
                if search(graph, start, dep, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = vec![start];
        if search(self, start, start, &mut path) {
            path.into_iter().map(str::to_string).collect()
        } else {
            vec![start.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::ProjectBuilder;

    #[test]
    fn test_lookup_and_is_workspace() {
        let graph = ProjectBuilder::new()
            .workspace("app", &[("lib", "1.0.0"), ("express", "^4.0.0")])
            .workspace("lib", &[("lodash", "^4.17.0")])
            .graph();

        assert!(graph.is_workspace("lib"));
        assert!(!graph.is_workspace("express"));
        assert!(graph.lookup("lodash").is_none());

        let app = graph.lookup("app").unwrap();
        assert_eq!(
            app.internal_dependency_names.iter().collect::<Vec<_>>(),
            vec!["lib"]
        );
        assert_eq!(app.reference.location, PathBuf::from("packages/app"));
    }

    #[test]
    fn test_missing_descriptor_is_malformed() {
        let mut infos = WorkspaceInfos::new();
        infos.insert("app".to_string(), crate::WorkspaceInfo::new("packages/app"));

        let result = ProjectGraph::build("/repo", &infos, &HashMap::new());

        assert!(matches!(
            result,
            Err(Error::MalformedWorkspaceData { ref name, .. }) if name == "app"
        ));
    }

    #[test]
    fn test_descriptor_name_mismatch_is_malformed() {
        let mut infos = WorkspaceInfos::new();
        infos.insert("app".to_string(), crate::WorkspaceInfo::new("packages/app"));
        let mut descriptors = HashMap::new();
        descriptors.insert(
            "app".to_string(),
            PackageDescriptor {
                name: Some("other".to_string()),
                ..PackageDescriptor::default()
            },
        );

        let error = ProjectGraph::build("/repo", &infos, &descriptors).unwrap_err();

        assert!(error.to_string().contains("'other'"));
    }

    #[test]
    fn test_unknown_workspace_dependency_is_malformed() {
        let mut infos = WorkspaceInfos::new();
        let mut info = crate::WorkspaceInfo::new("packages/app");
        info.workspace_dependencies.push("ghost".to_string());
        infos.insert("app".to_string(), info);
        let mut descriptors = HashMap::new();
        descriptors.insert("app".to_string(), PackageDescriptor::default());

        let result = ProjectGraph::build("/repo", &infos, &descriptors);

        assert!(matches!(result, Err(Error::MalformedWorkspaceData { .. })));
    }

    #[test]
    fn test_dev_only_workspace_dependency_is_not_internal() {
        let graph = ProjectBuilder::new()
            .workspace("app", &[])
            .dev_dependency("app", "tooling", "1.0.0")
            .workspace("tooling", &[])
            .graph();

        assert!(graph.lookup("app").unwrap().internal_dependency_names.is_empty());
    }

    #[test]
    fn test_build_order_puts_dependencies_first() {
        let graph = ProjectBuilder::new()
            .workspace("app", &[("lib", "1.0.0"), ("util", "1.0.0")])
            .workspace("lib", &[("util", "1.0.0")])
            .workspace("util", &[("lodash", "^4.17.0")])
            .graph();

        let order: Vec<&str> = graph
            .build_order()
            .unwrap()
            .into_iter()
            .map(WorkspaceNode::name)
            .collect();

        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        assert!(position("util") < position("lib"));
        assert!(position("lib") < position("app"));
    }

    #[test]
    fn test_build_order_reports_cycle() {
        let graph = ProjectBuilder::new()
            .workspace("a", &[("b", "1.0.0")])
            .workspace("b", &[("c", "1.0.0")])
            .workspace("c", &[("a", "1.0.0")])
            .graph();

        match graph.build_order() {
            Err(Error::CyclicWorkspaceDependency { cycle }) => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("Expected cycle error, got {other:?}"),
        }
    }
}
