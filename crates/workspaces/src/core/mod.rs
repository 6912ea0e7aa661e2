//! Core abstractions for workspace dependency resolution.
//!
//! - **Traits** - the collaborators that supply workspace metadata and package descriptors
//! - **Types** - the data model shared by the graph, walker, and flattener

pub mod traits;
pub mod types;

pub use traits::{DescriptorReader, WorkspaceMetadataProvider};
pub use types::{
    Dependency, PackageDescriptor, VersionReq, WorkspaceInfo, WorkspaceInfos, WorkspaceMetadata,
    WorkspaceNode, WorkspaceRef,
};
