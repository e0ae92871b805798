//! Telegram folder browser for Courier.
//!
//! Renders cloud-disk folders as inline keyboards and resolves button
//! presses back to remote paths. Paths too long for Telegram's 64-byte
//! callback data are replaced by digests recorded in the chat's session, so
//! a press can only be resolved while that session is alive.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use courier_core::Settings;
//! use courier_persistence::FileSessionStore;
//! use courier_telegram::{create_shared_state, RemoteEntry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileSessionStore::new(courier_core::config::sessions_dir()));
//! let state = create_shared_state(store, &Settings::from_env())?;
//!
//! let entries = vec![RemoteEntry::dir("Photos", "/Photos")];
//! let rendered = state.render_folder(123456789, "/", &entries, 0).await?;
//! // send rendered.markup; later:
//! let selection = state.resolve(123456789, "yd_open_p:L1Bob3Rvcw").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variables
//!
//! - `COURIER_SESSION_TTL_HOURS`: Idle hours before a chat's state is dropped
//! - `COURIER_MENU_PAGE_SIZE`: Entries per page
//! - `COURIER_RATE_LIMIT`: Button presses per second per user

pub mod cleanup;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod keyboards;
pub mod rate_limit;
pub mod state;

pub use dispatcher::{resolve_callback, NavSelection};
pub use error::{NavError, Result};
pub use handlers::{dispatch_callback, send_folder_menu, CallbackReply};
pub use keyboards::{restart_keyboard, EntryKind, FolderMenu, RemoteEntry, RenderedMenu};
pub use rate_limit::RateLimiter;
pub use state::{create_shared_state, NavigatorState};
