//! Paths command handler.
//!
//! Prints every resolved path in `key = value` form for diagnostics.

use std::path::Path;

use telecool_core::{DestinationResolver, DirectoryCreationStrategy, ensure_directory};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::destination_source_label;

pub fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let destination =
        DestinationResolver::new(ctx.settings.default_destination.clone()).resolve(None)?;

    println!("data_dir = {}", ctx.data_dir().display());
    println!("state_file = {}", ctx.state_file().display());
    println!("download_dir = {}", destination.path.display());
    println!(
        "download_dir_source = {}",
        destination_source_label(destination.source)
    );
    println!("download_dir_ready = {}", readiness(&destination.path));
    Ok(())
}

/// `yes`, or `no (<reason>)`. Never creates the directory.
fn readiness(dir: &Path) -> String {
    match ensure_directory(dir, DirectoryCreationStrategy::Disallow) {
        Ok(()) => "yes".to_string(),
        Err(e) => format!("no ({e})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_does_not_create_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("TeleCool");

        let report = readiness(&missing);
        assert!(report.starts_with("no ("), "{report}");
        assert!(!missing.exists());

        assert_eq!(readiness(tmp.path()), "yes");
    }
}
