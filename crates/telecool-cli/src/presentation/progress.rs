//! Progress bar for a single transfer.
//!
//! Draws to stderr; indicatif hides the bar when stderr is not a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use telecool_core::{TransferTask, format_rate};

/// Renders one transfer from registry snapshots and measured progress events.
///
/// The position never moves backwards, so an estimate followed by a lower
/// measurement does not make the bar jump.
pub struct TransferProgress {
    bar: ProgressBar,
    total: u64,
}

impl TransferProgress {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(spinner_style());
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, total: 0 }
    }

    /// Redraw from a registry snapshot.
    pub fn show_task(&mut self, task: &TransferTask) {
        self.set_total(task.total_bytes);
        if self.total > 0 {
            self.advance(task.transferred_bytes());
        }
        self.set_rate(task.rate_bytes_per_second);
    }

    /// Redraw from a measured progress event.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn show_measured(&mut self, fraction: f64, rate_bytes_per_second: f64) {
        if self.total > 0 {
            let position = (self.total as f64 * fraction / 100.0).round() as u64;
            self.advance(position);
        }
        self.set_rate(rate_bytes_per_second);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }

    /// Bytes currently shown.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    fn set_total(&mut self, total: u64) {
        if total == 0 || total == self.total {
            return;
        }
        if self.total == 0 {
            self.bar.set_style(bar_style());
        }
        self.bar.set_length(total);
        self.total = total;
    }

    fn advance(&self, position: u64) {
        let position = position.min(self.total);
        if position > self.bar.position() {
            self.bar.set_position(position);
        }
    }

    fn set_rate(&self, rate_bytes_per_second: f64) {
        self.bar
            .set_prefix(format!("@ {}", format_rate(rate_bytes_per_second)));
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg} {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg} {bar:28.cyan/blue} {bytes:>9} / {total_bytes:>9} ({percent:>3}%) {prefix}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}
