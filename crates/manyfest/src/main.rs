//! manyfest CLI application

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use manyfest::cli::{self, EXIT_OK, exit_code_for, render_error};
use manyfest::commands;
use manyfest::tracing::{TracingConfig, init_tracing};
use std::io::Write;

/// Exit code for SIGINT (128 + signal number 2)
const EXIT_SIGINT: i32 = 130;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let config = TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.into(),
    };
    if let Err(e) = init_tracing(config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let exit_code = run_with_tokio(&cli);
    std::process::exit(exit_code);
}

/// Create tokio runtime and run the command
fn run_with_tokio(cli: &cli::Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return 1;
        }
    };

    rt.block_on(run(cli))
}

async fn run(cli: &cli::Cli) -> i32 {
    tokio::select! {
        biased;

        _ = tokio::signal::ctrl_c() => EXIT_SIGINT,
        result = commands::execute(cli) => match result {
            Ok(output) => {
                let mut stdout = std::io::stdout().lock();
                if stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()).is_err() {
                    return 1;
                }
                EXIT_OK
            }
            Err(err) => {
                render_error(&err, cli.json);
                exit_code_for(&err)
            }
        }
    }
}
