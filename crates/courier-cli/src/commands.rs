//! Command implementations.

use std::error::Error;
use std::path::Path;

use chrono::Utc;
use courier_core::config;
use courier_core::{decode_path, parse_callback, path_callback, CallbackData, NavAction, Settings};
use courier_persistence::{FileSessionStore, SessionStore};
use courier_telegram::cleanup::{cleanup_old_temp_files, spawn_periodic_cleanup};
use courier_telegram::resolve_callback;

use crate::cli::{Commands, SessionCommands};

type CmdResult = Result<(), Box<dyn Error>>;

/// Run a parsed command against the state kept under `state_dir`.
pub async fn run(command: Commands, state_dir: &Path, settings: &Settings) -> CmdResult {
    let store = FileSessionStore::new(config::sessions_dir_in(state_dir));

    match command {
        Commands::Encode { path, action } => {
            println!("{}", describe_encoding(&path, action.into())?);
            Ok(())
        }
        Commands::Decode { data, chat } => decode(&data, chat, &store, settings),
        Commands::Sessions { command } => sessions(command, &store, settings),
        Commands::Cleanup {
            max_age_hours,
            watch,
        } => {
            let max_age = cleanup_max_age(max_age_hours, settings)?;
            let dir = config::temp_dir_in(state_dir);
            let removed = cleanup_old_temp_files(&dir, max_age);
            println!("Removed {} file(s) from {}", removed, dir.display());

            if watch {
                let every = settings.cleanup_interval.to_std()?;
                let handle = spawn_periodic_cleanup(dir, every, max_age);
                println!("Watching, press Ctrl+C to stop");
                tokio::signal::ctrl_c().await?;
                handle.abort();
            }
            Ok(())
        }
    }
}

/// Age threshold for temp cleanup; huge hour counts saturate instead of overflowing.
fn cleanup_max_age(
    hours: Option<u64>,
    settings: &Settings,
) -> Result<std::time::Duration, chrono::OutOfRangeError> {
    match hours {
        Some(hours) => Ok(std::time::Duration::from_secs(hours.saturating_mul(3600))),
        None => settings.temp_max_age.to_std(),
    }
}

/// Human-readable breakdown of how `path` is encoded for `action`.
pub fn describe_encoding(path: &str, action: NavAction) -> Result<String, courier_core::CodecError> {
    let codec = action.codec()?;
    let token = codec.encode(path);
    let data = path_callback(action, &token);

    let mut out = format!(
        "scheme:   {:?}\npayload:  {}\ncallback: {} ({} bytes)",
        token.scheme,
        token.payload,
        data,
        data.len()
    );
    if let Some(digest) = token.digest() {
        out.push_str(&format!("\nmapping:  {} -> {}", digest, path));
    }
    Ok(out)
}

/// Decode callback data. With a chat, resolve it against that chat's stored
/// session without touching the session itself.
fn decode(
    data: &str,
    chat: Option<i64>,
    store: &dyn SessionStore,
    settings: &Settings,
) -> CmdResult {
    if let Some(chat_id) = chat {
        let Some(record) = store.get(&chat_id.to_string())? else {
            println!("No session stored for chat {}.", chat_id);
            return Ok(());
        };
        if record.is_expired(settings.session_ttl, Utc::now()) {
            println!("Session for chat {} has expired; the bot will discard it.", chat_id);
        }
        match resolve_callback(data, &record) {
            Ok(selection) => println!("{:?}", selection),
            Err(e) => println!("{}\n{}", e, e.user_message()),
        }
        return Ok(());
    }

    match parse_callback(data)? {
        CallbackData::Path { action, token } => {
            let decoded = decode_path(&token)?;
            println!("action:   {:?}", action);
            println!("scheme:   {:?}", decoded.scheme());
            let (value, is_hash) = decoded.into_parts();
            if is_hash {
                println!("digest:   {} (pass --chat to resolve)", value);
            } else {
                println!("path:     {}", value);
            }
        }
        other => println!("{:?}", other),
    }
    Ok(())
}

fn sessions(command: SessionCommands, store: &dyn SessionStore, settings: &Settings) -> CmdResult {
    match command {
        SessionCommands::List => {
            let ids = store.list_ids()?;
            if ids.is_empty() {
                println!("No sessions stored.");
            }
            for id in ids {
                match store.get(&id)? {
                    Some(record) => println!(
                        "{}  updated {}  {} mapping(s)",
                        id,
                        courier_core::format::format_datetime(&record.updated_at),
                        record.path_mappings().len()
                    ),
                    None => println!("{}", id),
                }
            }
        }
        SessionCommands::Show { id } => match store.get(&id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => println!("Session {} not found.", id),
        },
        SessionCommands::Clear { id } => {
            if store.clear(&id)? {
                println!("Cleared session {}.", id);
            } else {
                println!("Session {} not found.", id);
            }
        }
        SessionCommands::Purge => {
            let purged = store.purge_expired(settings.session_ttl)?;
            println!("Purged {} expired session(s).", purged);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use courier_persistence::{MemorySessionStore, SessionRecord};

    #[test]
    fn test_describe_short_path() {
        let out = describe_encoding("/a", NavAction::Open).unwrap();
        assert!(out.contains("Direct"));
        assert!(out.contains("yd_open_p:L2E"));
        assert!(!out.contains("mapping"));
    }

    #[test]
    fn test_describe_long_path() {
        let path = "/folder1/folder2/folder3/folder4/folder5/folder6/folder7/folder8/folder9";
        let out = describe_encoding(path, NavAction::Pick).unwrap();
        assert!(out.contains("Hashed"));
        assert!(out.contains("yd_pick_h:"));
        assert!(out.contains(&format!("mapping:  {} -> {}", courier_core::path_digest(path), path)));
    }

    #[test]
    fn test_sessions_clear_and_purge() {
        let store = MemorySessionStore::new();
        store.set(&SessionRecord::new("42")).unwrap();

        sessions(SessionCommands::Purge, &store, &Settings::default()).unwrap();
        assert_eq!(store.list_ids().unwrap(), vec!["42".to_string()]);

        sessions(SessionCommands::Clear { id: "42".to_string() }, &store, &Settings::default())
            .unwrap();
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_decode_with_chat_leaves_session_untouched() {
        let store = MemorySessionStore::new();
        let path = "/folder1/folder2/folder3/folder4/folder5/folder6/folder7/folder8/folder9";
        let digest = courier_core::path_digest(path);

        let mut record = SessionRecord::new("42");
        let mut mappings = record.path_mappings();
        mappings.put(digest.as_str(), path);
        record.set_path_mappings(&mappings);
        record.updated_at = Utc::now() - Duration::hours(48);
        store.set(&record).unwrap();

        let data = format!("yd_open_h:{}", digest);
        decode(&data, Some(42), &store, &Settings::default()).unwrap();

        let after = store.get("42").unwrap().expect("expired session kept");
        assert_eq!(after.updated_at, record.updated_at);
        assert_eq!(after.path_mappings().get(&digest), Some(path));
    }

    #[test]
    fn test_cleanup_max_age() {
        let settings = Settings::default();
        assert_eq!(
            cleanup_max_age(Some(2), &settings).unwrap(),
            std::time::Duration::from_secs(7200)
        );
        assert_eq!(
            cleanup_max_age(Some(u64::MAX), &settings).unwrap(),
            std::time::Duration::from_secs(u64::MAX)
        );
        assert_eq!(
            cleanup_max_age(None, &settings).unwrap(),
            std::time::Duration::from_secs(24 * 3600)
        );
    }

    #[test]
    fn test_decode_without_session() {
        let store = MemorySessionStore::new();
        decode("yd_open_h:deadbeef", Some(7), &store, &Settings::default()).unwrap();
        assert!(store.list_ids().unwrap().is_empty());
    }
}
