//! Config command handler.

use telecool_core::{DestinationResolver, TransferManagerPort};

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::CliError;
use crate::presentation::destination_source_label;

/// Dispatch a config subcommand.
pub async fn execute(ctx: &CliContext, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Show => show(ctx).await,
        ConfigCommand::SetDestination { path } => {
            let path = ctx.manager.set_default_destination(&path).await?;
            println!("✓ Default destination set to {}", path.display());
            Ok(())
        }
        ConfigCommand::SetLimit { cap } => {
            ctx.manager.set_rate_cap(cap).await?;
            println!("✓ Rate cap set to {cap}");
            Ok(())
        }
    }
}

async fn show(ctx: &CliContext) -> Result<(), CliError> {
    let settings = &ctx.settings;
    let destination =
        DestinationResolver::new(settings.default_destination.clone()).resolve(None)?;

    println!("Current settings:");
    println!(
        "  Default destination:   {} ({})",
        destination.path.display(),
        destination_source_label(destination.source)
    );
    println!("  Rate cap:              {}", ctx.manager.rate_cap().await);
    println!(
        "  Max concurrent:        {}",
        settings.effective_max_concurrent()
    );
    println!(
        "  Estimator tick:        {} ms",
        settings.effective_tick_interval().as_millis()
    );
    println!("  State file:            {}", ctx.state_file().display());
    Ok(())
}
