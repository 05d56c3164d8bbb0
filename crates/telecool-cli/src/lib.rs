//! Command-line front end for telecool.
//!
//! `main.rs` parses arguments and dispatches; everything it needs lives here
//! so handlers can be exercised from tests.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, CliSource, SourceChoice, bootstrap};
pub use commands::{Commands, GetArgs};
pub use config_commands::ConfigCommand;
pub use error::CliError;
pub use parser::Cli;
