//! Compact encoding of remote paths for inline-button callback data.
//!
//! Telegram caps `callback_data` at 64 bytes, while cloud-disk paths are
//! unbounded. A path is embedded directly as `p:<base64url>` when it fits,
//! and otherwise replaced with `h:<digest>`, an 8-hex-digit SHA-256 prefix
//! that the caller must record in the session's [`PathMappings`] table
//! before the button is shown.
//!
//! Tokens without a prefix predate this scheme and are decoded as raw
//! base64url so that buttons rendered by older builds keep working.
//!
//! [`PathMappings`]: crate::mapping::PathMappings

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::callback::SEPARATOR;
use crate::error::{CodecError, Result};

/// Hard limit Telegram places on `callback_data`.
pub const MAX_CALLBACK_BYTES: usize = 64;

/// Headroom kept below [`MAX_CALLBACK_BYTES`].
pub const SAFETY_MARGIN: usize = 4;

/// Bytes available to prefix, separator and payload together.
pub const PAYLOAD_BUDGET: usize = MAX_CALLBACK_BYTES - SAFETY_MARGIN;

/// Prefix of a payload carrying the path inline.
pub const DIRECT_PREFIX: &str = "p:";

/// Prefix of a payload carrying a digest of the path.
pub const HASHED_PREFIX: &str = "h:";

/// Number of hex characters kept from the path digest.
pub const DIGEST_LEN: usize = 8;

/// Length of every hashed payload (`h:` plus the digest).
pub const HASHED_PAYLOAD_LEN: usize = HASHED_PREFIX.len() + DIGEST_LEN;

/// How a path is represented inside a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `p:` followed by the base64url path.
    Direct,
    /// `h:` followed by a digest resolved through the session table.
    Hashed,
    /// Bare base64url with no prefix, only ever produced by older builds.
    Legacy,
}

/// The result of encoding a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedToken {
    pub scheme: Scheme,
    pub payload: String,
}

impl EncodedToken {
    /// Returns the digest when this token needs a session table entry.
    pub fn digest(&self) -> Option<&str> {
        match self.scheme {
            Scheme::Hashed => self.payload.strip_prefix(HASHED_PREFIX),
            Scheme::Direct | Scheme::Legacy => None,
        }
    }

    /// Whether the caller must store `digest -> path` before using the token.
    pub fn needs_mapping(&self) -> bool {
        self.scheme == Scheme::Hashed
    }
}

/// The result of decoding a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedToken {
    /// Path recovered from a `p:` token.
    Direct(String),
    /// Path recovered from an unprefixed legacy token.
    Legacy(String),
    /// Digest that still has to be looked up in the session table.
    Hashed(String),
}

impl DecodedToken {
    pub fn scheme(&self) -> Scheme {
        match self {
            DecodedToken::Direct(_) => Scheme::Direct,
            DecodedToken::Legacy(_) => Scheme::Legacy,
            DecodedToken::Hashed(_) => Scheme::Hashed,
        }
    }

    pub fn is_hash(&self) -> bool {
        matches!(self, DecodedToken::Hashed(_))
    }

    /// Splits into the resolved value and whether it is a digest.
    pub fn into_parts(self) -> (String, bool) {
        match self {
            DecodedToken::Direct(path) | DecodedToken::Legacy(path) => (path, false),
            DecodedToken::Hashed(digest) => (digest, true),
        }
    }
}

/// Path encoder bound to the size of the wrapper around its payloads.
///
/// The wrapper is the action prefix plus separator that precede the payload
/// in the final callback data. Every payload this codec produces satisfies
/// `overhead + payload.len() <= PAYLOAD_BUDGET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathCodec {
    overhead: usize,
}

impl PathCodec {
    /// Create a codec for payloads wrapped in `overhead` bytes.
    pub fn with_overhead(overhead: usize) -> Result<Self> {
        if overhead + HASHED_PAYLOAD_LEN > PAYLOAD_BUDGET {
            return Err(CodecError::PrefixTooLong {
                prefix: String::new(),
                overhead,
            });
        }
        Ok(Self { overhead })
    }

    /// Create a codec for callback data of the form `<prefix>_<payload>`.
    pub fn for_prefix(prefix: &str) -> Result<Self> {
        let overhead = prefix.len() + SEPARATOR.len();
        Self::with_overhead(overhead).map_err(|_| CodecError::PrefixTooLong {
            prefix: prefix.to_string(),
            overhead,
        })
    }

    /// Bytes consumed by the wrapper around each payload.
    pub fn overhead(&self) -> usize {
        self.overhead
    }

    /// Longest payload this codec will emit.
    pub fn max_payload_len(&self) -> usize {
        PAYLOAD_BUDGET - self.overhead
    }

    /// Encode a path, falling back to a digest when it does not fit.
    pub fn encode(&self, path: &str) -> EncodedToken {
        let candidate = format!("{}{}", DIRECT_PREFIX, URL_SAFE_NO_PAD.encode(path.as_bytes()));
        if candidate.len() <= self.max_payload_len() {
            return EncodedToken {
                scheme: Scheme::Direct,
                payload: candidate,
            };
        }

        EncodedToken {
            scheme: Scheme::Hashed,
            payload: format!("{}{}", HASHED_PREFIX, path_digest(path)),
        }
    }

    /// Decode a payload produced by [`PathCodec::encode`] or by older builds.
    pub fn decode(&self, token: &str) -> Result<DecodedToken> {
        decode_path(token)
    }
}

/// Encode a path with no wrapper overhead.
pub fn encode_path(path: &str) -> EncodedToken {
    PathCodec::default().encode(path)
}

/// Decode a payload back into a path or a digest.
pub fn decode_path(token: &str) -> Result<DecodedToken> {
    if token.is_empty() {
        return Err(CodecError::malformed(token, "empty token"));
    }

    if let Some(encoded) = token.strip_prefix(DIRECT_PREFIX) {
        return decode_base64_path(token, encoded).map(DecodedToken::Direct);
    }

    if let Some(digest) = token.strip_prefix(HASHED_PREFIX) {
        if !is_digest(digest) {
            return Err(CodecError::malformed(
                token,
                format!("digest must be {} lowercase hex characters", DIGEST_LEN),
            ));
        }
        return Ok(DecodedToken::Hashed(digest.to_string()));
    }

    decode_base64_path(token, token).map(DecodedToken::Legacy)
}

/// First [`DIGEST_LEN`] hex characters of the SHA-256 of `path`.
///
/// Only 32 bits survive the truncation, so distinct paths can collide. The
/// session table resolves collisions by keeping the most recent write.
pub fn path_digest(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    hex::encode(&digest[..DIGEST_LEN / 2])
}

fn is_digest(s: &str) -> bool {
    s.len() == DIGEST_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn decode_base64_path(token: &str, encoded: &str) -> Result<String> {
    // Older builds emitted padded base64.
    let encoded = encoded.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| CodecError::malformed(token, e.to_string()))?;
    String::from_utf8(bytes).map_err(|_| CodecError::malformed(token, "path is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const DEEP_PATH: &str =
        "/folder1/folder2/folder3/folder4/folder5/folder6/folder7/folder8/folder9";

    #[test]
    fn test_short_path_is_direct() {
        let token = encode_path("/a");
        assert_eq!(token.scheme, Scheme::Direct);
        assert_eq!(token.payload, "p:L2E");
        assert!(!token.needs_mapping());
        assert_eq!(token.digest(), None);

        let decoded = decode_path(&token.payload).unwrap();
        assert_eq!(decoded, DecodedToken::Direct("/a".to_string()));
        assert_eq!(decoded.into_parts(), ("/a".to_string(), false));
    }

    #[test]
    fn test_long_path_is_hashed() {
        assert_eq!(DEEP_PATH.len(), 73);

        let token = encode_path(DEEP_PATH);
        assert_eq!(token.scheme, Scheme::Hashed);
        assert_eq!(token.payload.len(), HASHED_PAYLOAD_LEN);
        assert!(token.payload.starts_with("h:"));
        assert!(token.needs_mapping());

        let digest = token.digest().unwrap();
        assert_eq!(digest, path_digest(DEEP_PATH));

        let decoded = decode_path(&token.payload).unwrap();
        assert!(decoded.is_hash());
        assert_eq!(decoded.into_parts(), (digest.to_string(), true));
    }

    #[test]
    fn test_direct_threshold_boundary() {
        // 43 bytes -> 58 base64 chars -> 60 byte payload
        let fits = format!("/{}", "a".repeat(42));
        let token = encode_path(&fits);
        assert_eq!(token.scheme, Scheme::Direct);
        assert_eq!(token.payload.len(), PAYLOAD_BUDGET);

        let too_long = format!("/{}", "a".repeat(43));
        assert_eq!(encode_path(&too_long).scheme, Scheme::Hashed);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for path in ["/a", "/Photos/2024", DEEP_PATH] {
            assert_eq!(encode_path(path), encode_path(path));
        }
        let codec = PathCodec::for_prefix("yd_open").unwrap();
        assert_eq!(codec.encode(DEEP_PATH), codec.encode(DEEP_PATH));
    }

    #[test]
    fn test_payload_never_exceeds_budget() {
        let units = ["a", "/", "é", "папка", "文件", "🗂"];
        for unit in units {
            for len in 1..=500 {
                let path: String = unit.chars().cycle().take(len).collect();
                let token = encode_path(&path);
                assert!(
                    token.payload.len() <= PAYLOAD_BUDGET,
                    "payload for {} chars of {:?} is {} bytes",
                    len,
                    unit,
                    token.payload.len()
                );
            }
        }
    }

    #[test]
    fn test_wrapped_payload_fits_callback_limit() {
        let prefix = "yd_open";
        let codec = PathCodec::for_prefix(prefix).unwrap();
        assert_eq!(codec.overhead(), prefix.len() + 1);

        for len in 1..=500 {
            let path = format!("/{}", "x".repeat(len));
            let token = codec.encode(&path);
            let data = format!("{}_{}", prefix, token.payload);
            assert!(data.len() <= PAYLOAD_BUDGET);
            assert!(data.len() <= MAX_CALLBACK_BYTES);
            if token.scheme == Scheme::Direct {
                assert_eq!(codec.decode(&token.payload).unwrap(), DecodedToken::Direct(path));
            }
        }
    }

    #[test]
    fn test_overhead_shrinks_direct_threshold() {
        let path = format!("/{}", "a".repeat(42));
        assert_eq!(encode_path(&path).scheme, Scheme::Direct);

        let codec = PathCodec::for_prefix("yd_open").unwrap();
        assert_eq!(codec.encode(&path).scheme, Scheme::Hashed);
    }

    #[test]
    fn test_prefix_too_long_is_rejected() {
        let prefix = "x".repeat(PAYLOAD_BUDGET);
        let err = PathCodec::for_prefix(&prefix).unwrap_err();
        assert!(matches!(err, CodecError::PrefixTooLong { .. }));

        // Largest overhead that still leaves room for a hashed payload.
        let codec = PathCodec::with_overhead(PAYLOAD_BUDGET - HASHED_PAYLOAD_LEN).unwrap();
        assert_eq!(codec.encode(DEEP_PATH).payload.len(), HASHED_PAYLOAD_LEN);
        assert!(PathCodec::with_overhead(PAYLOAD_BUDGET - HASHED_PAYLOAD_LEN + 1).is_err());
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let path = "/Фото/2024";
        let token = encode_path(path);
        assert_eq!(token.scheme, Scheme::Direct);
        assert_eq!(
            decode_path(&token.payload).unwrap(),
            DecodedToken::Direct(path.to_string())
        );
    }

    #[test]
    fn test_legacy_token_decodes() {
        let legacy = URL_SAFE_NO_PAD.encode("/Documents/Photos");
        let decoded = decode_path(&legacy).unwrap();
        assert_eq!(decoded.scheme(), Scheme::Legacy);
        assert_eq!(decoded.into_parts(), ("/Documents/Photos".to_string(), false));
    }

    #[test]
    fn test_legacy_padded_token_decodes() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode("/a");
        assert!(padded.ends_with('='));
        assert_eq!(
            decode_path(&padded).unwrap(),
            DecodedToken::Legacy("/a".to_string())
        );
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "!!!", "p:%%%", "h:xyz", "h:BE560526", "h:be5605261", "_w"] {
            let err = decode_path(token).unwrap_err();
            assert!(
                matches!(err, CodecError::MalformedToken { .. }),
                "{:?} should be malformed, got {:?}",
                token,
                err
            );
        }
    }

    #[test]
    fn test_empty_path_round_trip() {
        let token = encode_path("");
        assert_eq!(token.payload, "p:");
        assert_eq!(decode_path("p:").unwrap(), DecodedToken::Direct(String::new()));
    }

    #[test]
    fn test_digest_is_truncated_to_32_bits() {
        // Known limitation: 8 hex digits admit collisions at scale. A small
        // sample of folder paths stays collision-free.
        let mut seen = HashSet::new();
        for i in 0..200 {
            let digest = path_digest(&format!("/uploads/{}/very/long/nested/folder", i));
            assert_eq!(digest.len(), DIGEST_LEN);
            assert!(is_digest(&digest));
            assert!(seen.insert(digest));
        }
    }
}
