//! Terminal output helpers.

mod progress;
mod tables;

pub use progress::TransferProgress;
pub use tables::{destination_source_label, format_history_row, print_separator, truncate_string};
