//! `manyfest list`

use super::Context;
use crate::cli::CliError;

/// Returns `name<TAB>location` for every workspace, dependencies first.
///
/// # Errors
///
/// Returns an error if the internal workspace graph has a cycle.
pub fn run(ctx: &Context) -> Result<String, CliError> {
    let order = ctx.graph.build_order()?;

    Ok(order.into_iter().fold(String::new(), |mut out, node| {
        out.push_str(node.name());
        out.push('\t');
        out.push_str(&node.reference.location.display().to_string());
        out.push('\n');
        out
    }))
}
