//! Per-session table resolving hashed callback tokens back to paths.
//!
//! The table lives inside the session's state mapping under
//! [`PATH_MAPPINGS_KEY`] and is loaded, modified and stored back as a plain
//! value. It is dropped together with the rest of the session state, so it
//! has no eviction of its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::EncodedToken;

/// Key of the digest table inside a session's state mapping.
pub const PATH_MAPPINGS_KEY: &str = "path_mappings";

/// Opaque per-session key/value state.
pub type SessionData = serde_json::Map<String, Value>;

/// Digest to path table for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathMappings(BTreeMap<String, String>);

impl PathMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the table out of a session's state.
    ///
    /// A missing or unreadable entry yields an empty table.
    pub fn load(data: &SessionData) -> Self {
        let Some(value) = data.get(PATH_MAPPINGS_KEY) else {
            return Self::default();
        };

        match serde_json::from_value(value.clone()) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable path mappings");
                Self::default()
            }
        }
    }

    /// Write the table back into a session's state.
    pub fn store_into(&self, data: &mut SessionData) {
        let value = Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        );
        data.insert(PATH_MAPPINGS_KEY.to_string(), value);
    }

    /// Insert or replace the path for `digest`.
    ///
    /// Returns the previous path when it differed from the new one.
    pub fn put(&mut self, digest: impl Into<String>, path: impl Into<String>) -> Option<String> {
        let digest = digest.into();
        let path = path.into();

        match self.0.insert(digest.clone(), path.clone()) {
            Some(previous) if previous != path => {
                warn!(digest = %digest, previous = %previous, path = %path, "Path digest collision, keeping latest");
                Some(previous)
            }
            _ => {
                debug!(digest = %digest, "Stored path mapping");
                None
            }
        }
    }

    /// Record the mapping for `token` if it is a hashed token.
    ///
    /// Returns true when an entry was written.
    pub fn remember(&mut self, token: &EncodedToken, path: &str) -> bool {
        match token.digest() {
            Some(digest) => {
                self.put(digest, path);
                true
            }
            None => false,
        }
    }

    /// Look up the path for `digest`.
    pub fn get(&self, digest: &str) -> Option<&str> {
        self.0.get(digest).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_path, Scheme};

    const DEEP_PATH: &str =
        "/folder1/folder2/folder3/folder4/folder5/folder6/folder7/folder8/folder9";

    #[test]
    fn test_get_on_empty_table() {
        let table = PathMappings::new();
        assert_eq!(table.get("deadbeef"), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let mut table = PathMappings::new();
        assert_eq!(table.put("be560526", DEEP_PATH), None);
        assert_eq!(table.get("be560526"), Some(DEEP_PATH));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_put_is_idempotent() {
        let mut table = PathMappings::new();
        table.put("be560526", DEEP_PATH);
        assert_eq!(table.put("be560526", DEEP_PATH), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_put_overwrites_on_collision() {
        let mut table = PathMappings::new();
        table.put("deadbeef", "/first");
        let previous = table.put("deadbeef", "/second");
        assert_eq!(previous, Some("/first".to_string()));
        assert_eq!(table.get("deadbeef"), Some("/second"));
    }

    #[test]
    fn test_remember_long_path() {
        let mut table = PathMappings::new();
        let token = encode_path(DEEP_PATH);
        assert_eq!(token.scheme, Scheme::Hashed);

        assert!(table.remember(&token, DEEP_PATH));
        let digest = token.digest().unwrap();
        assert_eq!(table.get(digest), Some(DEEP_PATH));
    }

    #[test]
    fn test_remember_skips_direct_tokens() {
        let mut table = PathMappings::new();
        let token = encode_path("/a");
        assert!(!table.remember(&token, "/a"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_session_data_round_trip() {
        let mut data = SessionData::new();
        data.insert("current_folder".to_string(), Value::String("/".to_string()));

        let mut table = PathMappings::load(&data);
        assert!(table.is_empty());
        table.put("be560526", DEEP_PATH);
        table.store_into(&mut data);

        assert_eq!(data["path_mappings"]["be560526"], DEEP_PATH);
        assert_eq!(data["current_folder"], "/");

        let reloaded = PathMappings::load(&data);
        assert_eq!(reloaded, table);
    }

    #[test]
    fn test_unreadable_mappings_load_empty() {
        let mut data = SessionData::new();
        data.insert(PATH_MAPPINGS_KEY.to_string(), Value::from(42));
        assert!(PathMappings::load(&data).is_empty());
    }
}
