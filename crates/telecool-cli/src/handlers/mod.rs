//! Command handlers.
//!
//! Each handler takes the composed `CliContext`, calls the transfer manager
//! and formats the result for the terminal. No engine logic lives here.

pub mod config;
pub mod get;
pub mod history;
pub mod paths;
