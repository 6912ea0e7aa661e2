// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! manyfest - flatten monorepo workspaces into bundle-ready manifests
//!
//! The binary is a thin layer over [`manyfest_workspaces`]: it locates the
//! project root, loads workspace metadata through the selected provider,
//! merges `manyfest.toml` settings with command-line flags, and prints the
//! result.
//!
//! ```text
//! $ manyfest --metadata package-json flatten @acme/app --external @acme/plugin-api --out-dir dist
//! ```

// CLI needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

/// CLI argument parsing and exit codes.
pub mod cli;
/// Command implementations (flatten, externals, list).
pub mod commands;
/// `manyfest.toml` loading and layering.
pub mod config;
/// Tracing subscriber setup.
pub mod tracing;
