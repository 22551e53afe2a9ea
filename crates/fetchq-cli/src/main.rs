//! CLI entry point.
//!
//! Loads `.env`, parses arguments, sets up logging and dispatches to a
//! handler. Errors become process exit codes through [`CliError`].

use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fetchq_cli::handlers::{self, serve::ServeArgs};
use fetchq_cli::{Cli, CliConfig, CliError, Commands, bootstrap};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help().context("Failed to print help")?;
        return Ok(());
    };

    // No worker needed
    if let Commands::Formats { quality } = command {
        handlers::formats::execute(*quality);
        return Ok(());
    }

    let ctx = bootstrap(CliConfig::from_cli(&cli))?;

    match command {
        Commands::Serve {
            port,
            max_concurrent,
            allowed_origins,
            keep_alive,
        } => {
            let args = ServeArgs {
                port: *port,
                max_concurrent: *max_concurrent,
                allowed_origins: allowed_origins.clone(),
                keep_alive: *keep_alive,
            };
            handlers::serve::execute(&ctx, args).await
        }
        Commands::Get { source, quality } => handlers::get::execute(&ctx, source, *quality).await,
        Commands::Probe { source, quality } => {
            handlers::probe::execute(&ctx, source, *quality).await
        }
        Commands::Sizes { source } => handlers::sizes::execute(&ctx, source).await,
        Commands::Formats { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}
