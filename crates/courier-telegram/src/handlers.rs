//! Telegram endpoints for folder-browser interactions.

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup};
use tracing::{debug, warn};

use crate::dispatcher::NavSelection;
use crate::error::{NavError, Result};
use crate::keyboards::{RemoteEntry, RenderedMenu};
use crate::state::NavigatorState;

/// How a button press is answered in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReply {
    /// Toast or alert text; `None` just stops the button's loading spinner.
    pub text: Option<&'static str>,
    pub show_alert: bool,
    /// Follow up with a message carrying the restart-from-root button.
    pub send_recovery: bool,
}

impl CallbackReply {
    pub fn for_result(result: &Result<NavSelection>) -> Self {
        match result {
            Ok(_) => Self {
                text: None,
                show_alert: false,
                send_recovery: false,
            },
            Err(e) => Self {
                text: Some(e.user_message()),
                show_alert: matches!(e, NavError::RateLimited),
                send_recovery: e.needs_restart(),
            },
        }
    }
}

/// Answer a folder-browser button press and resolve it.
///
/// Returns the resolved selection for the caller's flow to act on. Failures
/// are answered here: rate-limited presses get an alert, and unresolvable
/// ones get a recovery message with a button that restarts from the root.
pub async fn dispatch_callback(
    bot: &Bot,
    q: &CallbackQuery,
    state: &NavigatorState,
) -> ResponseResult<Option<NavSelection>> {
    let chat_id = ChatId(q.from.id.0 as i64);
    let data = q.data.as_deref().unwrap_or_default();
    debug!(chat_id = %chat_id.0, data = %data, "Callback received");

    let result = match state.allow(chat_id.0).await {
        Ok(()) => state.resolve(chat_id.0, data).await,
        Err(e) => Err(e),
    };

    let reply = CallbackReply::for_result(&result);
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(text) = reply.text {
        answer = answer.text(text).show_alert(reply.show_alert);
    }
    answer.await?;

    match result {
        Ok(selection) => Ok(Some(selection)),
        Err(e) => {
            warn!(chat_id = %chat_id.0, error = %e, "Could not resolve callback");
            if reply.send_recovery {
                send_recovery(bot, chat_id, &e).await?;
            }
            Ok(None)
        }
    }
}

/// Render `folder` for `chat_id` and send it as a new message.
///
/// Path digests are stored before the message goes out. If the session
/// store fails, the user gets the recovery message instead of a menu whose
/// buttons could not be resolved.
pub async fn send_folder_menu(
    bot: &Bot,
    chat_id: ChatId,
    state: &NavigatorState,
    folder: &str,
    entries: &[RemoteEntry],
    page: usize,
) -> ResponseResult<Option<RenderedMenu>> {
    match state.render_folder(chat_id.0, folder, entries, page).await {
        Ok(rendered) => {
            bot.send_message(chat_id, format!("📂 {}", folder))
                .reply_markup(rendered.markup.clone())
                .await?;
            Ok(Some(rendered))
        }
        Err(e) => {
            warn!(chat_id = %chat_id.0, error = %e, "Could not render folder menu");
            send_recovery(bot, chat_id, &e).await?;
            Ok(None)
        }
    }
}

async fn send_recovery(bot: &Bot, chat_id: ChatId, error: &NavError) -> ResponseResult<()> {
    let keyboard: InlineKeyboardMarkup = crate::keyboards::restart_keyboard();
    bot.send_message(chat_id, error.user_message())
        .reply_markup(keyboard)
        .await?;
    Ok(())
}
