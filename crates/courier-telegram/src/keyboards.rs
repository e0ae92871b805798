//! Inline keyboards for the cloud-disk folder browser.

use courier_core::format::{format_size, truncate_label};
use courier_core::{
    bare_callback, page_callback, path_callback, CodecError, NavAction, PathCodec, PathMappings,
};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Path of the disk root.
pub const ROOT_PATH: &str = "/";

/// Kind of a remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

/// A file or folder listed in the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

impl RemoteEntry {
    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Dir,
            size: None,
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::File,
            size: Some(size),
        }
    }

    fn label(&self) -> String {
        let name = truncate_label(&self.name);
        match (self.kind, self.size) {
            (EntryKind::Dir, _) => format!("📁 {}", name),
            (EntryKind::File, Some(size)) => format!("📄 {} ({})", name, format_size(size)),
            (EntryKind::File, None) => format!("📄 {}", name),
        }
    }
}

/// Whether `path` is a disk root such as `/` or `disk:/`.
pub fn is_root(path: &str) -> bool {
    path.is_empty() || path == ROOT_PATH || path.ends_with(":/")
}

/// Parent folder of `path`; roots are their own parent.
pub fn parent_path(path: &str) -> &str {
    if is_root(path) {
        return if path.is_empty() { ROOT_PATH } else { path };
    }

    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => {
            let parent = &trimmed[..idx];
            if parent.is_empty() || parent.ends_with(':') {
                &trimmed[..=idx]
            } else {
                parent
            }
        }
        None => ROOT_PATH,
    }
}

/// A rendered folder page.
///
/// `mappings` holds every digest issued for this page. They must be stored
/// in the session before `markup` is sent.
#[derive(Debug, Clone)]
pub struct RenderedMenu {
    pub markup: InlineKeyboardMarkup,
    pub mappings: PathMappings,
    pub page: usize,
    pub total_pages: usize,
}

/// Renders paginated folder listings.
#[derive(Debug, Clone)]
pub struct FolderMenu {
    page_size: usize,
    open: PathCodec,
    pick: PathCodec,
    info: PathCodec,
}

impl FolderMenu {
    pub fn new(page_size: usize) -> Result<Self, CodecError> {
        Ok(Self {
            page_size: page_size.max(1),
            open: NavAction::Open.codec()?,
            pick: NavAction::Pick.codec()?,
            info: NavAction::Info.codec()?,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Render `page` (zero-based, clamped) of `entries` inside `folder`.
    pub fn render(&self, folder: &str, entries: &[RemoteEntry], page: usize) -> RenderedMenu {
        let total_pages = entries.len().div_ceil(self.page_size).max(1);
        let page = page.min(total_pages - 1);
        let mut mappings = PathMappings::new();
        let mut rows = Vec::new();

        for entry in entries.iter().skip(page * self.page_size).take(self.page_size) {
            let action = match entry.kind {
                EntryKind::Dir => NavAction::Open,
                EntryKind::File => NavAction::Info,
            };
            rows.push(vec![self.path_button(entry.label(), action, &entry.path, &mut mappings)]);
        }

        if total_pages > 1 {
            let mut nav = Vec::new();
            if page > 0 {
                nav.push(InlineKeyboardButton::callback("⬅️", page_callback(page - 1)));
            }
            nav.push(InlineKeyboardButton::callback(
                format!("📄 {}/{}", page + 1, total_pages),
                bare_callback(NavAction::Noop),
            ));
            if page + 1 < total_pages {
                nav.push(InlineKeyboardButton::callback("➡️", page_callback(page + 1)));
            }
            rows.push(nav);
        }

        if !is_root(folder) {
            rows.push(vec![self.path_button(
                "⬆️ Up".to_string(),
                NavAction::Open,
                parent_path(folder),
                &mut mappings,
            )]);
        }

        rows.push(vec![self.path_button(
            "✅ Upload here".to_string(),
            NavAction::Pick,
            folder,
            &mut mappings,
        )]);
        rows.push(vec![InlineKeyboardButton::callback(
            "❌ Close",
            bare_callback(NavAction::Close),
        )]);

        RenderedMenu {
            markup: InlineKeyboardMarkup::new(rows),
            mappings,
            page,
            total_pages,
        }
    }

    fn path_button(
        &self,
        text: String,
        action: NavAction,
        path: &str,
        mappings: &mut PathMappings,
    ) -> InlineKeyboardButton {
        let codec = match action {
            NavAction::Pick => &self.pick,
            NavAction::Info => &self.info,
            _ => &self.open,
        };
        let token = codec.encode(path);
        mappings.remember(&token, path);
        InlineKeyboardButton::callback(text, path_callback(action, &token))
    }
}

/// Single-button keyboard that reopens the browser at the root.
pub fn restart_keyboard() -> InlineKeyboardMarkup {
    let token = courier_core::encode_path(ROOT_PATH);
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🔄 Restart from root",
        path_callback(NavAction::Open, &token),
    )]])
}
