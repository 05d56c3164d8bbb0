//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Fetch media from chats to local disk.
#[derive(Parser)]
#[command(name = "telecool")]
#[command(about = "Download media from chat messages to local disk")]
#[command(version)]
pub struct Cli {
    /// Override the data directory (settings and history) for this invocation
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["telecool", "--verbose", "--data-dir", "/tmp/tc", "paths"]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/tc")));
        assert!(matches!(cli.command, Some(Commands::Paths)));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["telecool", "history", "-v"]);
        assert!(cli.verbose);
    }
}
