// Transitive dependencies bring in multiple versions of foldhash and unicode-width
#![allow(clippy::multiple_crate_versions)]

//! Workspace dependency closure and manifest flattening for JavaScript monorepos.
//!
//! Given a monorepo whose packages depend on each other, this crate computes
//! the *external* dependency set a single workspace needs once its internal
//! workspace dependencies have been inlined by a bundler, and produces the
//! `package.json` that ships next to the bundle.
//!
//! # Architecture
//!
//! The crate is built around two collaborator traits and a pure core:
//!
//! - [`WorkspaceMetadataProvider`] - reports which workspaces exist and which
//!   of their dependencies point at other workspaces
//! - [`DescriptorReader`] - reads each workspace's `package.json`
//! - [`ProjectGraph`] - the immutable model built from both
//! - [`collect`] - walks the internal graph and returns the external leaves
//! - [`dedupe`] - collapses duplicate leaves with a [`ConflictPolicy`]
//! - [`flatten`] - ties it all together into a [`FlattenedManifest`]
//!
//! Everything after loading is synchronous and deterministic: the same graph
//! and options always produce the same manifest bytes.
//!
//! ## Feature flags
//!
//! - `provider-yarn` - [`YarnWorkspacesProvider`], backed by `yarn workspaces info` (**enabled by default**)
//! - `discovery-package-json` - [`PackageJsonWorkspacesProvider`], backed by the
//!   root `package.json` globs (**enabled by default**)
//!
//! ## Resolution behavior for edge cases
//!
//! - **Dependencies on non-workspace packages** are always leaves, even when
//!   a workspace with the same name exists under a different scope.
//! - **Explicit externals** are kept as leaves with the range the dependent
//!   declared, and are also listed as dependencies of the flattened manifest
//!   at their workspace version.
//! - **Cycles** in the internal graph are an error unless an explicit
//!   external cuts them.
//! - **Development dependencies** are never walked and never emitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use manyfest_workspaces::{
//!     find_project_root, flatten, load_project, FlattenOptions, FsDescriptorReader,
//!     YarnWorkspacesProvider,
//! };
//!
//! let root = find_project_root(&std::env::current_dir()?)?;
//! let graph = load_project(&root, &YarnWorkspacesProvider::default(), &FsDescriptorReader).await?;
//!
//! let manifest = flatten(&graph, "@acme/app", &FlattenOptions::default())?;
//! println!("bundle {} with externals {:?}", manifest.entry().display(), manifest.externals());
//! std::fs::write("dist/package.json", manifest.to_json_pretty()?)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod closure;
pub mod core;
pub mod dedupe;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod loader;
pub mod manifest;

#[cfg(test)]
mod test_fixtures;

// Re-export core types
pub use core::{
    Dependency, PackageDescriptor, VersionReq, WorkspaceInfo, WorkspaceInfos, WorkspaceMetadata,
    WorkspaceNode, WorkspaceRef,
};

// Re-export traits
pub use core::{DescriptorReader, WorkspaceMetadataProvider};

// Re-export resolution entry points
pub use closure::collect;
pub use dedupe::{ConflictPolicy, ExternalSet, VersionConflict, conflicts, dedupe};
pub use graph::ProjectGraph;
pub use loader::{LoadOptions, load_project, load_project_with};
pub use manifest::{BUNDLE_MAIN, FlattenOptions, FlattenedManifest, external_dependencies, flatten};

// Re-export error types
pub use error::{Error, Result};

// Re-export discovery types
pub use discovery::{FsDescriptorReader, InMemoryProject, find_project_root};

#[cfg(feature = "discovery-package-json")]
pub use discovery::{PackageJsonWorkspacesProvider, resolve_glob_patterns};

#[cfg(feature = "provider-yarn")]
pub use discovery::YarnWorkspacesProvider;
