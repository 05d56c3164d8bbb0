//! `telecool history`: list or clear completed transfers.

use telecool_core::TransferManagerPort;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{format_history_row, print_separator};

pub async fn execute(ctx: &CliContext, clear: bool) -> Result<(), CliError> {
    if clear {
        let count = ctx.manager.clear_completed().await?;
        println!("✓ Cleared {count} completed transfer(s).");
        return Ok(());
    }

    let completed = ctx.manager.list_completed().await;
    if completed.is_empty() {
        println!("No completed transfers.");
        return Ok(());
    }

    println!("{:<32} {:>10} {:<16} PATH", "NAME", "SIZE", "FINISHED");
    print_separator(80);
    for task in &completed {
        println!("{}", format_history_row(task));
    }
    println!();
    println!("{} completed transfer(s)", completed.len());
    Ok(())
}
