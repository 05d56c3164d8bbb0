//! CLI entry point.
//!
//! Parses arguments, installs logging, bootstraps the engine and dispatches
//! to a handler. Errors are printed once here and mapped to an exit code.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use telecool_cli::error::exit_code_for;
use telecool_cli::{Cli, CliConfig, Commands, SourceChoice, bootstrap, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// `-v` forces debug output for telecool targets; otherwise `RUST_LOG` applies.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,telecool=debug,telecool_download=debug,telecool_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut config = CliConfig::new(cli.data_dir)?;
    if let Commands::Get(ref args) = command {
        config = config
            .with_source(SourceChoice::from_args(args))
            .with_rate_cap(args.limit);
    }
    let ctx = bootstrap(config).await?;

    match command {
        Commands::Get(args) => {
            handlers::get::execute(&ctx, &args).await?;
        }
        Commands::History { clear } => {
            handlers::history::execute(&ctx, clear).await?;
        }
        Commands::Config { command } => {
            handlers::config::execute(&ctx, command).await?;
        }
        Commands::Paths => {
            handlers::paths::execute(&ctx)?;
        }
    }

    ctx.shutdown();
    Ok(())
}
