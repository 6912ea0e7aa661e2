//! Workspace metadata from yarn classic's `workspaces info` command.

use crate::core::traits::WorkspaceMetadataProvider;
use crate::core::types::WorkspaceInfos;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

const ARGS: [&str; 3] = ["--silent", "workspaces", "info"];

/// Runs `yarn --silent workspaces info` in the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YarnWorkspacesProvider {
    program: String,
}

impl Default for YarnWorkspacesProvider {
    fn default() -> Self {
        Self::new("yarn")
    }
}

impl YarnWorkspacesProvider {
    /// Creates a provider that runs the given yarn executable.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this provider invokes.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_line(&self) -> String {
        format!("{} {}", self.program, ARGS.join(" "))
    }
}

#[async_trait]
impl WorkspaceMetadataProvider for YarnWorkspacesProvider {
    fn name(&self) -> &'static str {
        "yarn"
    }

    #[tracing::instrument(skip(self), fields(program = %self.program))]
    async fn workspaces(&self, root: &Path) -> Result<WorkspaceInfos> {
        let output = Command::new(&self.program)
            .args(ARGS)
            .current_dir(root)
            .output()
            .await
            .map_err(|e| Error::MetadataCommandFailed {
                command: self.command_line(),
                message: format!("failed to start: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::MetadataCommandFailed {
                command: self.command_line(),
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_workspaces_info(&stdout).map_err(|e| match e {
            Error::MetadataCommandFailed { message, .. } => Error::MetadataCommandFailed {
                command: self.command_line(),
                message,
            },
            other => other,
        })
    }
}

/// Parses the JSON object printed by `yarn workspaces info`.
///
/// Banner lines yarn prints around the object are skipped.
///
/// # Errors
///
/// Returns [`Error::MetadataCommandFailed`] if the output holds no JSON
/// object, and [`Error::Json`] if the object is not a workspace map.
pub fn parse_workspaces_info(stdout: &str) -> Result<WorkspaceInfos> {
    let no_object = || Error::MetadataCommandFailed {
        command: ARGS.join(" "),
        message: "output contains no JSON object".to_string(),
    };
    let start = stdout.find('{').ok_or_else(no_object)?;
    serde_json::Deserializer::from_str(&stdout[start..])
        .into_iter::<WorkspaceInfos>()
        .next()
        .ok_or_else(no_object)?
        .map_err(|source| Error::Json { source, path: None })
}
