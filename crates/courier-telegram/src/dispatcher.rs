//! Resolution of folder-browser button presses.

use courier_core::{decode_path, parse_callback, CallbackData, DecodedToken, NavAction};
use courier_persistence::SessionRecord;
use tracing::{debug, info, warn};

use crate::error::{NavError, Result};

/// Session key holding the folder currently shown in the browser.
pub const CURRENT_FOLDER_KEY: &str = "current_folder";

/// Session key holding the page currently shown in the browser.
pub const CURRENT_PAGE_KEY: &str = "current_page";

/// What a button press asked for, with paths fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavSelection {
    /// Browse into this folder.
    Open(String),
    /// Use this folder as the upload target.
    Pick(String),
    /// Show details of this file.
    Info(String),
    /// Show another page of the current folder.
    Page { folder: String, page: usize },
    Close,
    Noop,
}

/// Resolve callback `data` against the pressing user's session.
///
/// Hashed tokens are looked up in the session's path mappings; a missing
/// digest means the session was reset or expired after the menu was drawn.
pub fn resolve_callback(data: &str, session: &SessionRecord) -> Result<NavSelection> {
    let callback = parse_callback(data).map_err(|e| {
        warn!(data = %data, error = %e, "Unparseable callback data");
        NavError::InvalidSelection(e)
    })?;

    match callback {
        CallbackData::Path { action, token } => {
            let path = resolve_token(&token, session)?;
            Ok(match action {
                NavAction::Pick => NavSelection::Pick(path),
                NavAction::Info => NavSelection::Info(path),
                _ => NavSelection::Open(path),
            })
        }
        CallbackData::Page(page) => {
            let folder = session.get_str(CURRENT_FOLDER_KEY).ok_or_else(|| {
                warn!(session_id = %session.session_id, "Page requested without a current folder");
                NavError::SessionExpired("current folder".to_string())
            })?;
            Ok(NavSelection::Page {
                folder: folder.to_string(),
                page,
            })
        }
        CallbackData::Close => Ok(NavSelection::Close),
        CallbackData::Noop => Ok(NavSelection::Noop),
    }
}

/// Turn an encoded token into a path, consulting the session for digests.
pub fn resolve_token(token: &str, session: &SessionRecord) -> Result<String> {
    match decode_path(token)? {
        DecodedToken::Direct(path) => Ok(path),
        DecodedToken::Legacy(path) => {
            info!(session_id = %session.session_id, "Resolved legacy callback token");
            Ok(path)
        }
        DecodedToken::Hashed(digest) => match session.path_mappings().get(&digest) {
            Some(path) => {
                debug!(session_id = %session.session_id, digest = %digest, "Resolved hashed path");
                Ok(path.to_string())
            }
            None => {
                warn!(session_id = %session.session_id, digest = %digest, "No path mapping for digest");
                Err(NavError::SessionExpired(format!("path mapping for {}", digest)))
            }
        },
    }
}
