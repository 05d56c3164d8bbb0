//! `telecool get`: run one transfer to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use telecool_core::{
    SourceRef, TransferEvent, TransferEventEmitterPort, TransferManagerPort, TransferRequest,
    TransferTask, format_bytes,
};
use telecool_download::TracingTransferEmitter;

use crate::bootstrap::CliContext;
use crate::commands::GetArgs;
use crate::error::CliError;
use crate::presentation::TransferProgress;

const REDRAW_INTERVAL: Duration = Duration::from_millis(200);

/// Build the engine request from command-line arguments.
pub fn request_from_args(args: &GetArgs) -> TransferRequest {
    let mut request = TransferRequest::new(SourceRef::new(args.chat.clone(), args.message));
    if let Some(ref name) = args.name {
        request = request.with_display_name(name.clone());
    }
    if let Some(size) = args.size {
        request = request.with_size_hint(size);
    }
    if let Some(ref dest) = args.dest {
        request = request.with_destination(dest.clone());
    }
    request
}

/// Execute the get command.
///
/// Returns the completed task; any failure is returned as a `CliError`
/// carrying the user-facing message.
pub async fn execute(ctx: &CliContext, args: &GetArgs) -> Result<TransferTask, CliError> {
    let mut events = ctx.events.subscribe();
    let id = Arc::clone(&ctx.manager)
        .enqueue(request_from_args(args))
        .await?;

    let label = ctx
        .manager
        .task(&id)
        .await
        .map_or_else(|| id.short(), |t| t.display_name);
    let mut progress = TransferProgress::new(&label);

    let wait = ctx.manager.wait_for(&id);
    tokio::pin!(wait);
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
    let mut listening = true;
    let log = TracingTransferEmitter::new();

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            _ = redraw.tick() => {
                if let Some(task) = ctx.manager.task(&id).await {
                    progress.show_task(&task);
                }
            }
            event = events.recv(), if listening => match event {
                Ok(event) => {
                    if let TransferEvent::TaskProgress {
                        id: event_id,
                        fraction,
                        rate_bytes_per_second,
                    } = &event
                    {
                        if *event_id == id {
                            progress.show_measured(*fraction, *rate_bytes_per_second);
                        }
                    }
                    log.emit(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress events lagged");
                }
                Err(RecvError::Closed) => listening = false,
            },
        }
    };

    match outcome {
        Ok(task) => {
            progress.finish();
            println!(
                "✓ Saved {} ({})",
                task.destination_path.display(),
                format_bytes(task.total_bytes)
            );
            Ok(task)
        }
        Err(e) => {
            progress.abandon();
            if e.is_recoverable() {
                eprintln!("  The transfer may succeed if you run the same command again.");
            }
            Err(e.into())
        }
    }
}
