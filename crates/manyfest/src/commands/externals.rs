//! `manyfest externals`

use super::Context;
use crate::cli::CliError;
use crate::config::WorkspaceSettings;
use manyfest_workspaces::external_dependencies;

/// Returns the external packages of `name`, one per line, in manifest order.
///
/// # Errors
///
/// Returns an error if the workspace or an explicit external is unknown, or
/// the walk hits a cycle.
pub fn run(ctx: &Context, name: &str, overrides: &WorkspaceSettings) -> Result<String, CliError> {
    let settings = ctx.config.resolve(name, overrides);
    let externals =
        external_dependencies(&ctx.graph, name, &settings.externals, settings.conflicts)?;

    Ok(externals.names().fold(String::new(), |mut out, package| {
        out.push_str(package);
        out.push('\n');
        out
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, monorepo};

    #[tokio::test]
    async fn test_externals_lists_closure() {
        let repo = monorepo();
        let ctx = context(repo.path()).await;

        let output = run(&ctx, "@acme/app", &WorkspaceSettings::default()).unwrap();

        assert_eq!(output, "lodash\nexpress\n");
    }

    #[tokio::test]
    async fn test_externals_respects_explicit_externals() {
        let repo = monorepo();
        let ctx = context(repo.path()).await;

        let output = run(
            &ctx,
            "@acme/app",
            &WorkspaceSettings {
                externals: vec!["@acme/lib".to_string()],
                ..WorkspaceSettings::default()
            },
        )
        .unwrap();

        assert_eq!(output, "@acme/lib\nexpress\n");
    }
}
