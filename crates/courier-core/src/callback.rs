//! Framing of folder-browser callback data.
//!
//! Buttons carry `<action prefix>_<payload>`, for example `yd_open_p:L2E`.
//! Path payloads come from [`PathCodec`], whose overhead is derived from the
//! action prefix so the whole string stays within the callback budget.

use crate::codec::{EncodedToken, PathCodec};
use crate::error::{CodecError, Result};

/// Separator between the action prefix and its payload.
pub const SEPARATOR: &str = "_";

/// Actions a folder-browser button can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    /// Browse into a folder.
    Open,
    /// Choose a folder as the upload target.
    Pick,
    /// Show details of a file.
    Info,
    /// Switch page within the current folder.
    Page,
    /// Close the menu.
    Close,
    /// Inert button (page indicator).
    Noop,
}

impl NavAction {
    const ALL: [NavAction; 6] = [
        NavAction::Open,
        NavAction::Pick,
        NavAction::Info,
        NavAction::Page,
        NavAction::Close,
        NavAction::Noop,
    ];

    pub const fn prefix(self) -> &'static str {
        match self {
            NavAction::Open => "yd_open",
            NavAction::Pick => "yd_pick",
            NavAction::Info => "yd_info",
            NavAction::Page => "yd_page",
            NavAction::Close => "yd_close",
            NavAction::Noop => "noop",
        }
    }

    /// Whether buttons for this action carry an encoded path.
    pub const fn carries_path(self) -> bool {
        matches!(self, NavAction::Open | NavAction::Pick | NavAction::Info)
    }

    /// Codec sized for this action's prefix.
    pub fn codec(self) -> Result<PathCodec> {
        PathCodec::for_prefix(self.prefix())
    }
}

/// Parsed callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    /// Path action with its still-encoded token.
    Path { action: NavAction, token: String },
    /// Page switch within the current folder.
    Page(usize),
    Close,
    Noop,
}

/// Callback data for a path action.
pub fn path_callback(action: NavAction, token: &EncodedToken) -> String {
    format!("{}{}{}", action.prefix(), SEPARATOR, token.payload)
}

/// Callback data for switching to `page`.
pub fn page_callback(page: usize) -> String {
    format!("{}{}{}", NavAction::Page.prefix(), SEPARATOR, page)
}

/// Callback data for an action without payload.
pub fn bare_callback(action: NavAction) -> String {
    action.prefix().to_string()
}

/// Parse callback data produced by this module.
pub fn parse_callback(data: &str) -> Result<CallbackData> {
    if data == NavAction::Close.prefix() {
        return Ok(CallbackData::Close);
    }
    if data == NavAction::Noop.prefix() {
        return Ok(CallbackData::Noop);
    }

    for action in NavAction::ALL {
        let Some(rest) = data
            .strip_prefix(action.prefix())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
        else {
            continue;
        };

        if action.carries_path() {
            return Ok(CallbackData::Path {
                action,
                token: rest.to_string(),
            });
        }
        if action == NavAction::Page {
            let page = rest
                .parse()
                .map_err(|_| CodecError::InvalidPage(rest.to_string()))?;
            return Ok(CallbackData::Page(page));
        }
    }

    Err(CodecError::UnknownAction(data.to_string()))
}
