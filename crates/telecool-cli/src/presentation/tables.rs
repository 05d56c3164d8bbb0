//! Table formatting utilities for CLI output.

use telecool_core::{DestinationSource, TransferTask, format_bytes};

/// Truncates a string to at most `max_len` characters, adding "..." if needed.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// One line of the `history` table.
pub fn format_history_row(task: &TransferTask) -> String {
    let finished = task
        .finished_at
        .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
    format!(
        "{:<32} {:>10} {:<16} {}",
        truncate_string(&task.display_name, 32),
        format_bytes(task.total_bytes),
        finished,
        task.destination_path.display()
    )
}

pub const fn destination_source_label(source: DestinationSource) -> &'static str {
    match source {
        DestinationSource::Explicit => "explicit",
        DestinationSource::EnvVar => "TELECOOL_DOWNLOAD_DIR",
        DestinationSource::Configured => "configured",
        DestinationSource::Default => "default",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telecool_core::SourceRef;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("ääääää", 5), "ää...");
    }

    #[test]
    fn test_history_row() {
        let task = TransferTask::new("clip.mp4", 1536, SourceRef::new("c", 1), "/srv/clip.mp4");
        let row = format_history_row(&task);
        assert!(row.starts_with("clip.mp4"));
        assert!(row.contains("1.5 KB"));
        assert!(row.contains(" - "));
        assert!(row.ends_with("/srv/clip.mp4"));
    }
}
