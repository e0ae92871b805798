//! Cleanup of temporary files downloaded from Telegram before upload.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Delete one temporary file. Returns true if it was removed.
pub fn cleanup_temp_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Cleaned up temp file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to clean up temp file");
            false
        }
    }
}

/// Delete files in `dir` whose modification time is at least `max_age` ago.
///
/// Returns the number of files removed. A missing directory counts as empty.
pub fn cleanup_old_temp_files(dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            error!(dir = %dir.display(), error = %e, "Failed to read temp directory");
            return 0;
        }
    };

    let mut cleaned = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .unwrap_or_default();
        if age >= max_age && cleanup_temp_file(&path) {
            cleaned += 1;
        }
    }

    if cleaned > 0 {
        info!(count = cleaned, dir = %dir.display(), "Cleaned up old temp files");
    }
    cleaned
}

/// Sweep `dir` every `every`, starting one interval from now.
pub fn spawn_periodic_cleanup(dir: PathBuf, every: Duration, max_age: Duration) -> JoinHandle<()> {
    info!(
        dir = %dir.display(),
        interval_secs = every.as_secs(),
        max_age_secs = max_age.as_secs(),
        "Starting periodic temp cleanup"
    );

    tokio::spawn(async move {
        let mut ticker = interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cleanup_old_temp_files(&dir, max_age);
        }
    })
}
