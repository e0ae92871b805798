//! Persistence layer for Courier.
//!
//! Session state is stored per chat using atomic file operations (write to
//! temp file, then rename), or kept in memory for tests and ephemeral bots.
//!
//! # Example
//!
//! ```no_run
//! use courier_persistence::{FileSessionStore, SessionRecord, SessionStore};
//!
//! let store = FileSessionStore::new("/home/user/.courier/state/sessions");
//!
//! let mut record = SessionRecord::new("123456789");
//! record.set("current_folder", "/Photos");
//! store.set(&record).unwrap();
//!
//! let loaded = store.get("123456789").unwrap();
//! ```

pub mod atomic;
pub mod error;
pub mod session_store;

pub use error::{PersistenceError, Result};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionRecord, SessionStore};
