//! Error types for folder-browser navigation.

use courier_core::CodecError;
use courier_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur while handling a folder-browser button press.
#[derive(Debug, Error)]
pub enum NavError {
    /// Callback data could not be parsed or decoded.
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] CodecError),

    /// Session state needed to resolve the press is gone (reset, expired or never written).
    #[error("Session expired: no {0}")]
    SessionExpired(String),

    /// Too many presses from this user within the rate window.
    #[error("Rate limited")]
    RateLimited,

    /// Session store failure.
    #[error("Session store error: {0}")]
    Store(#[from] PersistenceError),
}

impl NavError {
    /// Message shown to the user alongside the restart button.
    pub fn user_message(&self) -> &'static str {
        match self {
            NavError::InvalidSelection(_) => "⚠️ Invalid selection. Please open the folder list again.",
            NavError::SessionExpired(_) => {
                "⏳ Session expired, please restart navigation from the root folder."
            }
            NavError::RateLimited => "⚠️ Too many requests. Please wait a moment.",
            NavError::Store(_) => "⚠️ Something went wrong. Please restart navigation.",
        }
    }

    /// Whether the user should be offered a fresh menu.
    pub fn needs_restart(&self) -> bool {
        !matches!(self, NavError::RateLimited)
    }
}

/// Result type for navigation operations.
pub type Result<T> = std::result::Result<T, NavError>;
