//! End-to-end resolution over the on-disk fixture monorepo.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use manyfest_workspaces::{
    ConflictPolicy, Error, FlattenOptions, FsDescriptorReader, LoadOptions,
    PackageJsonWorkspacesProvider, ProjectGraph, conflicts, collect, find_project_root, flatten,
    load_project, load_project_with,
};
use std::collections::HashSet;
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("test-monorepo-npm")
}

async fn load() -> ProjectGraph {
    load_project(
        &fixture_root(),
        &PackageJsonWorkspacesProvider,
        &FsDescriptorReader,
    )
    .await
    .expect("fixture project should load")
}

fn pairs(manifest: &manyfest_workspaces::FlattenedManifest) -> Vec<(&str, &str)> {
    manifest.dependencies().iter().collect()
}

#[tokio::test]
async fn test_fixture_discovers_every_member_but_excluded() {
    let graph = load().await;

    assert_eq!(
        graph.workspace_names().collect::<Vec<_>>(),
        vec!["@acme/app", "@acme/cli", "@acme/core", "@acme/tooling", "@acme/ui"]
    );
    assert!(!graph.is_workspace("excluded"));
}

#[test]
fn test_find_project_root_from_member_directory() {
    let member = fixture_root().join("packages").join("app").join("src");

    assert_eq!(find_project_root(&member).unwrap(), fixture_root());
}

#[tokio::test]
async fn test_flatten_inlines_workspaces_transitively() {
    let graph = load().await;

    let manifest = flatten(&graph, "@acme/app", &FlattenOptions::default()).unwrap();

    assert_eq!(
        manifest.entry(),
        fixture_root().join("packages/app/src/index.js")
    );
    assert_eq!(
        pairs(&manifest),
        vec![
            ("lodash", "^4.17.21"),
            ("express", "^4.17.0"),
            ("react", "^18.2.0"),
        ]
    );
    assert!(manifest.dev_dependencies().is_empty());
    assert_eq!(manifest.name(), Some("@acme/app"));
    assert_eq!(manifest.version(), Some("2.0.0"));
    assert_eq!(manifest.license(), Some("MIT"));
}

#[tokio::test]
async fn test_flatten_dev_dependencies_are_never_walked() {
    let graph = load().await;

    let manifest = flatten(&graph, "@acme/app", &FlattenOptions::default()).unwrap();

    assert!(!manifest.dependencies().contains("typescript"));
    assert!(!manifest.dependencies().contains("jest"));
    assert!(!manifest.dependencies().contains("@acme/tooling"));
}

#[tokio::test]
async fn test_flatten_with_explicit_external() {
    let graph = load().await;
    let options = FlattenOptions {
        externals: vec!["@acme/core".to_string()],
        ..FlattenOptions::default()
    };

    let manifest = flatten(&graph, "@acme/app", &options).unwrap();

    assert_eq!(
        pairs(&manifest),
        vec![
            ("@acme/core", "^1.0.0"),
            ("react", "^18.2.0"),
            ("express", "^4.18.0"),
        ]
    );
}

#[tokio::test]
async fn test_flatten_overwrite_policy_keeps_last_range() {
    let graph = load().await;
    let options = FlattenOptions {
        conflict_policy: ConflictPolicy::Overwrite,
        ..FlattenOptions::default()
    };

    let manifest = flatten(&graph, "@acme/app", &options).unwrap();

    assert_eq!(manifest.dependencies().get("express"), Some("^4.18.0"));
}

#[tokio::test]
async fn test_conflicts_report_range_disagreements() {
    let graph = load().await;

    let deps = collect(&graph, "@acme/app", &HashSet::new()).unwrap();
    let found = conflicts(&deps);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "express");
}

#[tokio::test]
async fn test_mismatched_workspace_is_still_inlined() {
    let graph = load().await;

    let cli = graph.lookup("@acme/cli").unwrap();
    assert!(cli.mismatched_dependency_names.contains("@acme/core"));

    let manifest = flatten(&graph, "@acme/cli", &FlattenOptions::default()).unwrap();
    assert_eq!(
        manifest.externals(),
        vec!["lodash", "express", "yargs"]
    );
    assert_eq!(
        manifest.entry(),
        fixture_root().join("packages/cli/bin/cli.js")
    );
}

#[tokio::test]
async fn test_package_json_output_is_deterministic() {
    let first = flatten(&load().await, "@acme/ui", &FlattenOptions::default())
        .unwrap()
        .to_json_pretty()
        .unwrap();
    let second = flatten(&load().await, "@acme/ui", &FlattenOptions::default())
        .unwrap()
        .to_json_pretty()
        .unwrap();

    assert_eq!(first, second);
    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["main"], "index.js");
    assert_eq!(value["name"], "@acme/ui");
    assert!(value.get("license").is_none());
}

#[tokio::test]
async fn test_unknown_root_is_reported() {
    let graph = load().await;

    let result = flatten(&graph, "@acme/missing", &FlattenOptions::default());

    assert!(matches!(
        result,
        Err(Error::WorkspaceNotFound { ref name }) if name == "@acme/missing"
    ));
}

#[tokio::test]
async fn test_ignored_workspace_is_left_as_leaf() {
    let options = LoadOptions::default().ignoring("@acme/ui");
    let graph = load_project_with(
        &fixture_root(),
        &PackageJsonWorkspacesProvider,
        &FsDescriptorReader,
        &options,
    )
    .await
    .unwrap();

    let manifest = flatten(&graph, "@acme/app", &FlattenOptions::default()).unwrap();

    assert_eq!(
        pairs(&manifest),
        vec![("@acme/ui", "^1.0.0"), ("express", "^4.18.0")]
    );
}

#[tokio::test]
async fn test_build_order_over_fixture() {
    let graph = load().await;

    let order: Vec<&str> = graph
        .build_order()
        .unwrap()
        .into_iter()
        .map(|node| node.name())
        .collect();
    let position = |name: &str| order.iter().position(|n| *n == name).unwrap();

    assert!(position("@acme/core") < position("@acme/ui"));
    assert!(position("@acme/ui") < position("@acme/app"));
    assert!(position("@acme/core") < position("@acme/cli"));
}
