//! Fixed workspace data, for embedding and tests.

use crate::core::traits::{DescriptorReader, WorkspaceMetadataProvider};
use crate::core::types::{PackageDescriptor, WorkspaceInfo, WorkspaceInfos};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// A project held entirely in memory.
///
/// Acts as both the metadata provider and the descriptor reader, so a whole
/// resolution can run without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProject {
    infos: WorkspaceInfos,
    descriptors: HashMap<String, PackageDescriptor>,
}

impl InMemoryProject {
    /// Creates a project from a workspace map and one descriptor per workspace.
    #[must_use]
    pub fn new(infos: WorkspaceInfos, descriptors: HashMap<String, PackageDescriptor>) -> Self {
        Self { infos, descriptors }
    }

    /// Adds a workspace and its descriptor.
    #[must_use]
    pub fn with_workspace(
        mut self,
        name: impl Into<String>,
        info: WorkspaceInfo,
        descriptor: PackageDescriptor,
    ) -> Self {
        let name = name.into();
        self.infos.insert(name.clone(), info);
        self.descriptors.insert(name, descriptor);
        self
    }
}

#[async_trait]
impl WorkspaceMetadataProvider for InMemoryProject {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn workspaces(&self, _root: &Path) -> Result<WorkspaceInfos> {
        Ok(self.infos.clone())
    }
}

#[async_trait]
impl DescriptorReader for InMemoryProject {
    async fn read(
        &self,
        _root: &Path,
        name: &str,
        _info: &WorkspaceInfo,
    ) -> Result<PackageDescriptor> {
        self.descriptors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::malformed(name, "no package descriptor was found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_what_it_was_given() {
        let project = InMemoryProject::default().with_workspace(
            "lib",
            WorkspaceInfo::new("packages/lib"),
            PackageDescriptor {
                name: Some("lib".to_string()),
                ..PackageDescriptor::default()
            },
        );

        let infos = project.workspaces(Path::new("/repo")).await.unwrap();
        assert_eq!(infos.keys().collect::<Vec<_>>(), vec!["lib"]);

        let descriptor = project
            .read(Path::new("/repo"), "lib", &infos["lib"])
            .await
            .unwrap();
        assert_eq!(descriptor.name.as_deref(), Some("lib"));
    }

    #[tokio::test]
    async fn test_unknown_descriptor_is_malformed() {
        let project = InMemoryProject::default();

        let result = project
            .read(Path::new("/repo"), "ghost", &WorkspaceInfo::new("ghost"))
            .await;

        assert!(matches!(result, Err(Error::MalformedWorkspaceData { .. })));
    }
}
