use anyhow::Context;
use arc_import::cli::{Cli, commands};
use arc_import::format::{ErrorEnvelope, OutputContext};
use arc_import::logging::init_logging;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Error: failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = OutputContext::from_flags(cli.json, cli.quiet);
    match runtime.block_on(commands::run(&cli, &ctx)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            if ctx.is_json() {
                match serde_json::to_string(&ErrorEnvelope::from(&err)) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("Error: {err}"),
                }
            } else {
                eprintln!("Error: {err}");
            }
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
