//! Shared navigation state for the folder browser.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use courier_core::Settings;
use courier_persistence::{SessionRecord, SessionStore};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::dispatcher::{resolve_callback, NavSelection, CURRENT_FOLDER_KEY, CURRENT_PAGE_KEY};
use crate::error::{NavError, Result};
use crate::keyboards::{FolderMenu, RemoteEntry, RenderedMenu};
use crate::rate_limit::RateLimiter;

/// Folder-browser state shared across handlers.
///
/// Sessions are cached in memory and written through to the store on every
/// change, so a restarted bot can still resolve buttons it drew earlier.
pub struct NavigatorState {
    /// Cached sessions (chat_id -> record).
    sessions: RwLock<HashMap<i64, SessionRecord>>,
    store: Arc<dyn SessionStore>,
    menu: FolderMenu,
    limiter: RateLimiter,
    session_ttl: Duration,
}

impl NavigatorState {
    pub fn new(store: Arc<dyn SessionStore>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            menu: FolderMenu::new(settings.page_size)?,
            limiter: RateLimiter::new(settings.rate_limit),
            session_ttl: settings.session_ttl,
        })
    }

    pub fn menu(&self) -> &FolderMenu {
        &self.menu
    }

    /// Check the per-user rate limit for a button press.
    pub async fn allow(&self, chat_id: i64) -> Result<()> {
        if self.limiter.check(chat_id).await {
            Ok(())
        } else {
            Err(NavError::RateLimited)
        }
    }

    /// Render a folder page and record its path digests in the chat's session.
    ///
    /// The session is persisted before the markup is returned, so every
    /// hashed button in it is resolvable by the time the user can press it.
    pub async fn render_folder(
        &self,
        chat_id: i64,
        folder: &str,
        entries: &[RemoteEntry],
        page: usize,
    ) -> Result<RenderedMenu> {
        let rendered = self.menu.render(folder, entries, page);

        let mut sessions = self.sessions.write().await;
        let mut record = self.load(&mut sessions, chat_id)?;

        let mut mappings = record.path_mappings();
        for (digest, path) in rendered.mappings.iter() {
            mappings.put(digest, path);
        }
        record.set_path_mappings(&mappings);
        record.set(CURRENT_FOLDER_KEY, folder);
        record.set(CURRENT_PAGE_KEY, rendered.page);
        record.touch();

        self.store.set(&record)?;
        debug!(
            chat_id = %chat_id,
            folder = %folder,
            page = rendered.page,
            new_digests = rendered.mappings.len(),
            "Rendered folder menu"
        );
        sessions.insert(chat_id, record);

        Ok(rendered)
    }

    /// Resolve a pressed button's callback data for `chat_id`.
    pub async fn resolve(&self, chat_id: i64, data: &str) -> Result<NavSelection> {
        let mut sessions = self.sessions.write().await;
        let mut record = self.load(&mut sessions, chat_id)?;

        let selection = resolve_callback(data, &record);

        if selection.is_ok() {
            record.touch();
            if let Err(e) = self.store.set(&record) {
                warn!(chat_id = %chat_id, error = %e, "Failed to persist session activity");
            }
        }
        sessions.insert(chat_id, record);

        selection
    }

    /// Discard the chat's session state, path mappings included.
    pub async fn reset(&self, chat_id: i64) -> Result<()> {
        self.sessions.write().await.remove(&chat_id);
        if self.store.clear(&chat_id.to_string())? {
            info!(chat_id = %chat_id, "Session state cleared");
        }
        Ok(())
    }

    /// Folder the chat last viewed, if its session is still alive.
    pub async fn current_folder(&self, chat_id: i64) -> Result<Option<String>> {
        let mut sessions = self.sessions.write().await;
        let record = self.load(&mut sessions, chat_id)?;
        let folder = record.get_str(CURRENT_FOLDER_KEY).map(str::to_string);
        sessions.insert(chat_id, record);
        Ok(folder)
    }

    /// Drop every session idle for longer than the configured TTL.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        self.sessions
            .write()
            .await
            .retain(|_, record| !record.is_expired(self.session_ttl, now));
        self.limiter.prune().await;
        Ok(self.store.purge_expired(self.session_ttl)?)
    }

    /// Current session for `chat_id`, cached or loaded, with expired state discarded.
    fn load(&self, sessions: &mut HashMap<i64, SessionRecord>, chat_id: i64) -> Result<SessionRecord> {
        let session_id = chat_id.to_string();
        let record = match sessions.remove(&chat_id) {
            Some(record) => Some(record),
            None => self.store.get(&session_id)?,
        };

        match record {
            Some(record) if record.is_expired(self.session_ttl, Utc::now()) => {
                info!(chat_id = %chat_id, "Session expired, discarding state");
                self.store.clear(&session_id)?;
                Ok(SessionRecord::new(session_id))
            }
            Some(record) => Ok(record),
            None => Ok(SessionRecord::new(session_id)),
        }
    }
}

/// Create shared navigator state.
pub fn create_shared_state(
    store: Arc<dyn SessionStore>,
    settings: &Settings,
) -> Result<Arc<NavigatorState>> {
    Ok(Arc::new(NavigatorState::new(store, settings)?))
}
