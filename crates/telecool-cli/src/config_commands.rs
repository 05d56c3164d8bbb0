//! Configuration subcommands.

use clap::Subcommand;

use telecool_core::RateCap;

/// Settings management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the current settings
    Show,
    /// Set the default destination directory (created if missing)
    SetDestination {
        /// Absolute path or ~/...
        path: String,
    },
    /// Set the persisted per-transfer rate cap
    SetLimit {
        /// unlimited, standard, pro, or a byte rate such as 512K or 2MiB
        cap: RateCap,
    },
}
