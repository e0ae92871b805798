//! Display helpers for upload progress, file listings and file names.

use std::path::Path;

use chrono::{DateTime, TimeZone};

/// Width of the bar drawn by [`progress_bar`] by default.
pub const DEFAULT_BAR_LENGTH: usize = 10;

/// Longest file name shown on a button before it is shortened.
pub const MAX_LABEL_CHARS: usize = 30;

const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Render `[████████░░] 80%`. Percent is clamped to 0..=100.
pub fn progress_bar(percent: i64, length: usize) -> String {
    let percent = percent.clamp(0, 100);
    let filled = (percent as usize * length) / 100;
    let empty = length - filled;
    format!("[{}{}] {}%", "█".repeat(filled), "░".repeat(empty), percent)
}

/// Human-readable size, e.g. `234 B`, `1.5 KB`, `3.2 MB`, `1.25 GB`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

/// Format as `07.02.2026 15:30`.
pub fn format_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%d.%m.%Y %H:%M").to_string()
}

/// Replace characters that are unsafe on disk or in remote paths.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');

    if trimmed.is_empty() {
        "unnamed_file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased extension including the dot, or an empty string.
pub fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Append `_1`, `_2`, ... to the stem until the name is not taken.
pub fn unique_filename<S: AsRef<str>>(base: &str, existing: &[S]) -> String {
    let taken = |candidate: &str| existing.iter().any(|e| e.as_ref() == candidate);
    if !taken(base) {
        return base.to_string();
    }

    let path = Path::new(base);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(base);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, ext);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Shorten a label to [`MAX_LABEL_CHARS`] characters.
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() <= MAX_LABEL_CHARS {
        return name.to_string();
    }
    let head: String = name.chars().take(MAX_LABEL_CHARS - 3).collect();
    format!("{}...", head)
}
