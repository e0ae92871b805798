//! Courier Core - shared logic for the Courier bot.
//!
//! - **codec**: encode remote paths into callback-sized tokens and back
//! - **mapping**: per-session digest table for paths too long to embed
//! - **callback**: folder-browser callback framing
//! - **config**: state directory layout and runtime settings
//! - **format**: progress bars, sizes, dates and file names for display

pub mod callback;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod mapping;

pub use callback::{
    bare_callback, page_callback, parse_callback, path_callback, CallbackData, NavAction,
};
pub use codec::{
    decode_path, encode_path, path_digest, DecodedToken, EncodedToken, PathCodec, Scheme,
    MAX_CALLBACK_BYTES, PAYLOAD_BUDGET,
};
pub use config::Settings;
pub use error::{CodecError, Result};
pub use mapping::{PathMappings, SessionData, PATH_MAPPINGS_KEY};
