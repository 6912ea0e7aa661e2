//! Collaborator traits the core depends on for workspace data.

use crate::core::types::{PackageDescriptor, WorkspaceInfo, WorkspaceInfos};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Supplies authoritative workspace membership for a project.
///
/// Implementations usually shell out to a package manager, but the core only
/// sees the resulting map, so tests can substitute fixed in-memory data.
///
/// # Example
///
/// ```rust,ignore
/// use manyfest_workspaces::{WorkspaceInfos, WorkspaceMetadataProvider};
///
/// struct Fixed(WorkspaceInfos);
///
/// #[async_trait::async_trait]
/// impl WorkspaceMetadataProvider for Fixed {
///     fn name(&self) -> &'static str { "fixed" }
///
///     async fn workspaces(&self, _root: &Path) -> Result<WorkspaceInfos> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait WorkspaceMetadataProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Returns every workspace of the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be obtained or parsed.
    async fn workspaces(&self, root: &Path) -> Result<WorkspaceInfos>;
}

/// Reads the raw package descriptor of a single workspace.
#[async_trait]
pub trait DescriptorReader: Send + Sync {
    /// Reads the descriptor of the workspace `name` described by `info`.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is missing or malformed.
    async fn read(&self, root: &Path, name: &str, info: &WorkspaceInfo)
    -> Result<PackageDescriptor>;
}
