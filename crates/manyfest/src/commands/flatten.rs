//! `manyfest flatten`

use super::{Context, absolutize};
use crate::cli::CliError;
use crate::config::WorkspaceSettings;
use manyfest_workspaces::manifest::PackageJson;
use manyfest_workspaces::{FlattenOptions, FlattenedManifest, WorkspaceNode, WorkspaceRef, flatten};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const OUT_DIR_PLACEHOLDER: &str = "{name}";

/// Command output: what to bundle, what to leave out, and the manifest to ship.
#[derive(Debug, Serialize)]
struct FlattenOutput<'a> {
    entry: &'a Path,
    externals: Vec<&'a str>,
    manifest: PackageJson<'a>,
}

impl<'a> From<&'a FlattenedManifest> for FlattenOutput<'a> {
    fn from(manifest: &'a FlattenedManifest) -> Self {
        Self {
            entry: manifest.entry(),
            externals: manifest.externals(),
            manifest: manifest.package_json(),
        }
    }
}

/// Which workspaces one `flatten` run covers.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    /// The named workspaces, in the order given.
    Named(&'a [String]),
    /// Every workspace that declares a `main`, in project order.
    All,
}

/// Flattens `name` and returns the pretty-printed command output.
///
/// Relative `entry` and `out-dir` values from `manyfest.toml` are taken
/// relative to the project root. A `{name}` placeholder in `out-dir` is
/// replaced by the workspace name without its scope.
///
/// # Errors
///
/// Returns an error if flattening fails or the manifest cannot be written.
pub fn run(ctx: &Context, name: &str, overrides: &WorkspaceSettings) -> Result<String, CliError> {
    let (manifest, out_dir) = flatten_one(ctx, name, overrides, false)?;
    if let Some(out_dir) = &out_dir {
        write_manifest(out_dir, &manifest)?;
    }
    to_pretty_json(&FlattenOutput::from(&manifest))
}

/// Flattens every selected workspace and returns the pretty-printed output.
///
/// A single named workspace prints the same object as [`run`]; anything else
/// prints an array of them. With several workspaces an `out-dir` without the
/// `{name}` placeholder gets one subdirectory per workspace. Nothing is
/// written unless every workspace flattens.
///
/// # Errors
///
/// Returns a configuration error if `--entry` is combined with several
/// workspaces or two workspaces would write to the same directory, and
/// otherwise the first flatten or write failure.
pub fn run_many(
    ctx: &Context,
    selection: Selection<'_>,
    overrides: &WorkspaceSettings,
) -> Result<String, CliError> {
    let names: Vec<&str> = match selection {
        Selection::Named([name]) => return run(ctx, name, overrides),
        Selection::Named(names) => names.iter().map(String::as_str).collect(),
        Selection::All => ctx
            .graph
            .workspaces()
            .filter(|workspace| workspace.entry_point.is_some())
            .map(WorkspaceNode::name)
            .collect(),
    };
    if overrides.entry.is_some() {
        return Err(CliError::config_with_help(
            "--entry cannot be used with more than one workspace",
            "Set per-workspace entry points in manyfest.toml",
        ));
    }

    let mut flattened = Vec::with_capacity(names.len());
    let mut targets: HashMap<PathBuf, &str> = HashMap::new();
    for name in names {
        let (manifest, out_dir) = flatten_one(ctx, name, overrides, true)?;
        if let Some(out_dir) = &out_dir {
            if let Some(other) = targets.insert(out_dir.clone(), name) {
                return Err(CliError::config_with_help(
                    format!(
                        "Workspaces '{other}' and '{name}' would both write {}",
                        out_dir.join("package.json").display()
                    ),
                    "Use distinct out-dir settings for these workspaces",
                ));
            }
        }
        flattened.push((manifest, out_dir));
    }

    for (manifest, out_dir) in &flattened {
        if let Some(out_dir) = out_dir {
            write_manifest(out_dir, manifest)?;
        }
    }
    tracing::info!(workspaces = flattened.len(), "Flattened workspaces");

    let outputs: Vec<FlattenOutput<'_>> = flattened
        .iter()
        .map(|(manifest, _)| FlattenOutput::from(manifest))
        .collect();
    to_pretty_json(&outputs)
}

/// Flattens one workspace and works out where its manifest goes, if anywhere.
fn flatten_one(
    ctx: &Context,
    name: &str,
    overrides: &WorkspaceSettings,
    nested: bool,
) -> Result<(FlattenedManifest, Option<PathBuf>), CliError> {
    let settings = ctx.config.resolve(name, overrides);
    let options = FlattenOptions {
        entry: settings.entry.as_deref().map(|p| absolutize(&ctx.root, p)),
        externals: settings.externals,
        conflict_policy: settings.conflicts,
    };
    tracing::debug!(workspace = name, ?options, "Flattening workspace");

    let manifest = flatten(&ctx.graph, name, &options)?;
    let out_dir = settings
        .out_dir
        .as_deref()
        .map(|dir| absolutize(&ctx.root, &expand_out_dir(dir, name, nested)));
    Ok((manifest, out_dir))
}

/// Expands `{name}` in `out_dir`; without it, `nested` appends the name.
fn expand_out_dir(out_dir: &Path, name: &str, nested: bool) -> PathBuf {
    let safe_name = WorkspaceRef::new(name, "").path_safe_name().to_string();
    let template = out_dir.to_string_lossy();
    if template.contains(OUT_DIR_PLACEHOLDER) {
        PathBuf::from(template.replace(OUT_DIR_PLACEHOLDER, &safe_name))
    } else if nested {
        out_dir.join(safe_name)
    } else {
        out_dir.to_path_buf()
    }
}

fn write_manifest(dir: &Path, manifest: &FlattenedManifest) -> Result<(), CliError> {
    let content = manifest.to_json_pretty()?;
    let io_error = |e: std::io::Error| {
        CliError::other_with_help(
            format!("Failed to write {}: {e}", dir.join("package.json").display()),
            "Check that the output directory is writable",
        )
    };
    std::fs::create_dir_all(dir).map_err(io_error)?;
    std::fs::write(dir.join("package.json"), format!("{content}\n")).map_err(io_error)?;
    tracing::info!(path = %dir.display(), "Wrote package.json");
    Ok(())
}

fn to_pretty_json<T: Serialize + ?Sized>(output: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(output).map_err(|e| {
        CliError::other_with_help(
            format!("Failed to serialize output: {e}"),
            "This is a bug; please report it",
        )
    })
}
