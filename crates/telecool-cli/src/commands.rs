//! Top-level subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};

use telecool_core::RateCap;

use crate::config_commands::ConfigCommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download the media attached to one message
    Get(GetArgs),

    /// Show or clear the completed transfer list
    History {
        /// Forget every completed transfer
        #[arg(long)]
        clear: bool,
    },

    /// View or change persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show resolved data and download paths
    Paths,
}

/// Arguments for `telecool get`.
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("backend").required(true).args(["library", "server"])))]
pub struct GetArgs {
    /// Chat identifier
    #[arg(long)]
    pub chat: String,

    /// Message identifier within the chat
    #[arg(long)]
    pub message: i64,

    /// File name to save as (defaults to file_<message>)
    #[arg(long)]
    pub name: Option<String>,

    /// Expected size in bytes, used for progress until the real size is known
    #[arg(long)]
    pub size: Option<u64>,

    /// Destination directory (absolute or ~/...)
    #[arg(long)]
    pub dest: Option<String>,

    /// Rate cap for this run only: unlimited, standard, pro, 512K, 2M, ...
    #[arg(long)]
    pub limit: Option<RateCap>,

    /// Local mirror laid out as <dir>/<chat>/<message>
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// HTTP bridge base URL
    #[arg(long)]
    pub server: Option<String>,

    /// Bearer token for the HTTP bridge
    #[arg(long, env = "TELECOOL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::parser::Cli;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("telecool").chain(args.iter().copied()))
    }

    #[test]
    fn test_get_with_library() {
        let cli = parse(&[
            "get", "--chat", "family", "--message", "42", "--library", "/srv/mirror", "--limit",
            "standard",
        ])
        .unwrap();
        let Some(Commands::Get(args)) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.chat, "family");
        assert_eq!(args.message, 42);
        assert_eq!(args.library, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(args.limit, Some(RateCap::STANDARD));
        assert!(args.server.is_none());
    }

    #[test]
    fn test_get_requires_a_backend() {
        assert!(parse(&["get", "--chat", "c", "--message", "1"]).is_err());
    }

    #[test]
    fn test_get_rejects_both_backends() {
        assert!(
            parse(&[
                "get", "--chat", "c", "--message", "1", "--library", "/a", "--server",
                "http://localhost:1"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_get_rejects_bad_limit() {
        assert!(
            parse(&["get", "--chat", "c", "--message", "1", "--library", "/a", "--limit", "fast"])
                .is_err()
        );
    }

    #[test]
    fn test_history_clear() {
        let cli = parse(&["history", "--clear"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::History { clear: true })));
    }
}
