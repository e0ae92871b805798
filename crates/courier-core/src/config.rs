//! Shared configuration for Courier.
//!
//! Provides functions to locate Courier's state directory and the runtime
//! settings read from the environment.
//!
//! # Storage Structure
//!
//! All application data is stored under `~/.courier/`:
//!
//! ```text
//! ~/.courier/
//! ├── config/       # .env.local with bot secrets
//! ├── cache/
//! │   └── uploads/  # Temporary files awaiting upload
//! ├── logs/
//! └── state/
//!     └── sessions/ # Per-chat session state
//! ```
//!
//! # Environment Variables
//!
//! - `COURIER_STATE_DIR`: Override the base state directory
//! - `COURIER_TEMP_DIR`: Override the temporary upload directory
//! - `COURIER_SESSION_TTL_HOURS`: Idle hours before session state is dropped (default 24)
//! - `COURIER_MENU_PAGE_SIZE`: Entries per folder-browser page (default 10)
//! - `COURIER_RATE_LIMIT`: Requests per second per user (default 5)
//! - `COURIER_CLEANUP_INTERVAL_HOURS`: Temp cleanup interval (default 24)
//! - `COURIER_TEMP_MAX_AGE_HOURS`: Age after which temp files are removed (default 24)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::Duration;
use tracing::warn;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "COURIER_STATE_DIR";

/// Environment variable for custom temporary upload directory.
pub const TEMP_DIR_ENV: &str = "COURIER_TEMP_DIR";

pub const SESSION_TTL_ENV: &str = "COURIER_SESSION_TTL_HOURS";
pub const PAGE_SIZE_ENV: &str = "COURIER_MENU_PAGE_SIZE";
pub const RATE_LIMIT_ENV: &str = "COURIER_RATE_LIMIT";
pub const CLEANUP_INTERVAL_ENV: &str = "COURIER_CLEANUP_INTERVAL_HOURS";
pub const TEMP_MAX_AGE_ENV: &str = "COURIER_TEMP_MAX_AGE_HOURS";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".courier";

// Subdirectory names
const LOGS_SUBDIR: &str = "logs";
const CONFIG_SUBDIR: &str = "config";
const CACHE_SUBDIR: &str = "cache";
const STATE_SUBDIR: &str = "state";
const SESSIONS_SUBDIR: &str = "sessions";
const UPLOADS_SUBDIR: &str = "uploads";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the Courier state directory.
///
/// The state directory is determined by:
/// 1. `COURIER_STATE_DIR` environment variable if set
/// 2. `~/.courier` if home directory is available
/// 3. `.courier` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the sessions directory path.
///
/// Holds one JSON file per chat with its navigation state.
pub fn sessions_dir() -> PathBuf {
    sessions_dir_in(&state_dir())
}

/// Sessions directory under an explicit state directory.
pub fn sessions_dir_in(base: &Path) -> PathBuf {
    base.join(STATE_SUBDIR).join(SESSIONS_SUBDIR)
}

/// Get the temporary upload directory.
///
/// Defaults to `~/.courier/cache/uploads/` or `COURIER_TEMP_DIR` env var.
pub fn temp_dir() -> PathBuf {
    temp_dir_in(&state_dir())
}

/// Temporary upload directory under an explicit state directory.
///
/// `COURIER_TEMP_DIR` still takes precedence.
pub fn temp_dir_in(base: &Path) -> PathBuf {
    std::env::var(TEMP_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| base.join(CACHE_SUBDIR).join(UPLOADS_SUBDIR))
}

/// Get the .env.local file path.
///
/// Environment file for secrets (bot token, API tokens).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Load `.env.local` from the config directory, then a local `.env`.
pub fn load_env() {
    load_env_from(&state_dir());
}

/// Like [`load_env`], reading the config directory under `base`.
pub fn load_env_from(base: &Path) {
    let env_path = base.join(CONFIG_SUBDIR).join(".env.local");
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}

/// Ensure the state directory and all subdirectories exist.
///
/// # Errors
/// Returns an error if any directory cannot be created.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    ensure_dirs_in(&state_dir())
}

/// Create the directory layout under an explicit state directory.
pub fn ensure_dirs_in(base: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(base.join(LOGS_SUBDIR))?;
    std::fs::create_dir_all(base.join(CONFIG_SUBDIR))?;
    std::fs::create_dir_all(sessions_dir_in(base))?;
    std::fs::create_dir_all(temp_dir_in(base))?;
    Ok(())
}

/// Runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Idle time after which a session's state, path mappings included, is dropped.
    pub session_ttl: Duration,
    /// Entries per folder-browser page.
    pub page_size: usize,
    /// Requests per second allowed per user.
    pub rate_limit: usize,
    /// Interval between temp directory sweeps.
    pub cleanup_interval: Duration,
    /// Age after which temp files are removed.
    pub temp_max_age: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24),
            page_size: 10,
            rate_limit: 5,
            cleanup_interval: Duration::hours(24),
            temp_max_age: Duration::hours(24),
        }
    }
}

impl Settings {
    /// Read settings from the environment, keeping defaults for unset or invalid values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let hours = |key: &str, default: Duration| {
            parse_positive::<i64>(&lookup, key)
                .and_then(|h| {
                    let duration = Duration::try_hours(h);
                    if duration.is_none() {
                        warn!(key = %key, hours = h, "Setting out of range, using default");
                    }
                    duration
                })
                .unwrap_or(default)
        };

        Self {
            session_ttl: hours(SESSION_TTL_ENV, defaults.session_ttl),
            page_size: parse_positive(&lookup, PAGE_SIZE_ENV).unwrap_or(defaults.page_size),
            rate_limit: parse_positive(&lookup, RATE_LIMIT_ENV).unwrap_or(defaults.rate_limit),
            cleanup_interval: hours(CLEANUP_INTERVAL_ENV, defaults.cleanup_interval),
            temp_max_age: hours(TEMP_MAX_AGE_ENV, defaults.temp_max_age),
        }
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Some(value),
        _ => {
            warn!(key = %key, value = %raw, "Ignoring invalid setting, using default");
            None
        }
    }
}
