//! Command-line interface definition using clap.

use clap::{Parser, Subcommand, ValueEnum};
use courier_core::{config, NavAction};
use std::path::PathBuf;

/// Courier - inspect callback tokens and bot session state
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to state directory
    #[arg(short, long, env = "COURIER_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// State directory from `--state-dir`, falling back to the configured default.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(config::state_dir)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a remote path into folder-browser callback data
    Encode {
        /// Remote path, e.g. /Photos/2024
        path: String,

        /// Button action the data is for
        #[arg(short, long, value_enum, default_value = "open")]
        action: ActionArg,
    },

    /// Decode callback data, resolving digests when a chat is given
    Decode {
        /// Callback data as received from Telegram
        data: String,

        /// Chat whose session should resolve hashed paths
        #[arg(short, long, allow_hyphen_values = true)]
        chat: Option<i64>,
    },

    /// Inspect or clear stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Remove old temporary upload files
    Cleanup {
        /// Remove files older than this many hours (default: COURIER_TEMP_MAX_AGE_HOURS)
        #[arg(long)]
        max_age_hours: Option<u64>,

        /// Keep running and sweep every COURIER_CLEANUP_INTERVAL_HOURS until Ctrl+C
        #[arg(short, long)]
        watch: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List stored session IDs
    List,

    /// Show a session's state and path mappings
    Show {
        /// Session ID (chat ID)
        #[arg(allow_hyphen_values = true)]
        id: String,
    },

    /// Drop a session's state
    Clear {
        /// Session ID (chat ID)
        #[arg(allow_hyphen_values = true)]
        id: String,
    },

    /// Drop every session idle longer than the configured TTL
    Purge,
}

/// Path-carrying button actions.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionArg {
    Open,
    Pick,
    Info,
}

impl From<ActionArg> for NavAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Open => NavAction::Open,
            ActionArg::Pick => NavAction::Pick,
            ActionArg::Info => NavAction::Info,
        }
    }
}
