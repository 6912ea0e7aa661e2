//! Error types for workspace resolution and manifest flattening.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for workspace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a project or flattening a workspace.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A requested root or explicitly named workspace does not exist in the project.
    #[error("Workspace '{name}' not found in project")]
    #[diagnostic(
        code(manyfest::workspaces::workspace_not_found),
        help("Check the workspace name, including its scope (e.g. '@scope/name')")
    )]
    WorkspaceNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// Neither an entry override nor a declared `main` is available.
    #[error("Workspace '{name}' has no 'main' in its manifest")]
    #[diagnostic(
        code(manyfest::workspaces::no_entry_point),
        help("Add a 'main' field to the workspace's package.json or pass an explicit entry")
    )]
    NoEntryPoint {
        /// The workspace without an entry point.
        name: String,
    },

    /// Metadata and descriptor providers returned inconsistent data.
    #[error("Malformed workspace data for '{name}': {message}")]
    #[diagnostic(
        code(manyfest::workspaces::malformed_workspace_data),
        help("Re-run your package manager's install so workspace metadata matches the package.json files")
    )]
    MalformedWorkspaceData {
        /// The workspace the inconsistency was found on.
        name: String,
        /// Description of the inconsistency.
        message: String,
    },

    /// The internal workspace graph contains a cycle.
    #[error("Cyclic workspace dependency: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(manyfest::workspaces::cyclic_dependency),
        help("Break the cycle, or pass one of the workspaces as an explicit external")
    )]
    CyclicWorkspaceDependency {
        /// The workspaces forming the cycle, starting and ending with the same name.
        cycle: Vec<String>,
    },

    /// No project root was found above the starting directory.
    #[error("No workspace project root found at or above {path}")]
    #[diagnostic(
        code(manyfest::workspaces::project_root_not_found),
        help("Run from inside a monorepo whose root package.json declares 'workspaces'")
    )]
    ProjectRootNotFound {
        /// The directory the search started from.
        path: PathBuf,
    },

    /// Invalid workspace configuration.
    #[error("Invalid workspace configuration at {path}: {message}")]
    #[diagnostic(
        code(manyfest::workspaces::invalid_config),
        help("Check the 'workspaces' field of the root package.json")
    )]
    InvalidWorkspaceConfig {
        /// Path to the invalid configuration file.
        path: PathBuf,
        /// Description of what is invalid.
        message: String,
    },

    /// The package manager used as metadata provider failed.
    #[error("Workspace metadata command '{command}' failed: {message}")]
    #[diagnostic(
        code(manyfest::workspaces::metadata_command_failed),
        help("Ensure the package manager is installed and the project has been installed")
    )]
    MetadataCommandFailed {
        /// The command line that was run.
        command: String,
        /// Captured failure output.
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(manyfest::workspaces::io_error),
        help("Check that the referenced paths exist and that you have permission to read them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(manyfest::workspaces::json_error),
        help("Ensure the JSON has valid syntax and matches the package.json schema")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Creates a [`Error::WorkspaceNotFound`] for `name`.
    #[must_use]
    pub fn workspace_not_found(name: impl Into<String>) -> Self {
        Self::WorkspaceNotFound { name: name.into() }
    }

    /// Creates a [`Error::MalformedWorkspaceData`].
    #[must_use]
    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedWorkspaceData {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_workspace_not_found_error() {
        let error = Error::workspace_not_found("@acme/app");

        let message = error.to_string();
        assert!(message.contains("Workspace '@acme/app' not found"));
    }

    #[test]
    fn test_no_entry_point_error() {
        let error = Error::NoEntryPoint {
            name: "lib".to_string(),
        };

        assert!(error.to_string().contains("has no 'main'"));
        assert!(error.help().is_some());
    }

    #[test]
    fn test_cycle_is_rendered_as_chain() {
        let error = Error::CyclicWorkspaceDependency {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };

        assert_eq!(error.to_string(), "Cyclic workspace dependency: a -> b -> a");
    }

    #[test]
    fn test_malformed_error() {
        let error = Error::malformed("lib", "no package descriptor");

        let message = error.to_string();
        assert!(message.contains("'lib'"));
        assert!(message.contains("no package descriptor"));
    }

    #[test]
    fn test_io_error_no_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = Error::Io {
            source: io_error,
            path: None,
            operation: "reading package.json".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("I/O error during reading package.json"));
        assert!(!message.contains(" at "));
    }

    #[test]
    fn test_io_error_with_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io {
            source: io_error,
            path: Some(PathBuf::from("/repo/packages/app/package.json")),
            operation: "reading json file".to_string(),
        };

        assert!(error.to_string().contains("/repo/packages/app/package.json"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let error: Error = json_error.into();

        match error {
            Error::Json { source: _, path } => assert_eq!(path, None),
            _ => panic!("Expected Json error variant"),
        }
    }

    #[test]
    fn test_diagnostic_codes() {
        let error = Error::workspace_not_found("x");
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("manyfest::workspaces::workspace_not_found".to_string())
        );

        let error = Error::ProjectRootNotFound {
            path: PathBuf::from("/tmp"),
        };
        assert!(error.code().is_some());
        assert!(error.help().is_some());

        let error = Error::MetadataCommandFailed {
            command: "yarn --silent workspaces info".to_string(),
            message: "not found".to_string(),
        };
        assert!(error.code().is_some());
    }
}
