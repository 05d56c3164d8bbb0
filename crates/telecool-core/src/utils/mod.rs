//! Small display helpers shared by adapters.

pub mod format;

pub use format::{format_bytes, format_rate};
