//! Cookie-session signing key and cookie policy.
//!
//! Release builds insist on a readable key file of at least 64 bytes and
//! refuse generated keys. Debug builds fall back to a generated key with a
//! warning. Key bytes are zeroised once the key is derived.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

use super::config::CivicSettings;

const SESSION_KEY_MIN_LEN: usize = 64;
/// Shortest input `Key::derive_from` accepts.
const DERIVE_MIN_LEN: usize = 32;
const FINGERPRINT_BYTES: usize = 8;

/// Build mode for session validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Tolerates generated keys.
    Debug,
    /// Requires a key file.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Session middleware inputs.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionKeyError {
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("CIVIC_ALLOW_EPHEMERAL_SESSION_KEY must be false in release builds")]
    EphemeralNotAllowed,
}

/// Resolve session settings for `mode`.
///
/// # Errors
///
/// Fails in release builds when ephemeral keys are enabled or the key file
/// is missing or short.
pub fn session_settings(
    settings: &CivicSettings,
    mode: BuildMode,
) -> Result<SessionSettings, SessionKeyError> {
    if mode == BuildMode::Release && settings.allow_ephemeral_session_key {
        return Err(SessionKeyError::EphemeralNotAllowed);
    }
    let allow_generated = mode == BuildMode::Debug || settings.allow_ephemeral_session_key;
    let key = load_key(&settings.session_key_file(), mode, allow_generated)?;
    Ok(SessionSettings {
        key,
        cookie_secure: settings.cookie_secure,
        same_site: SameSite::Lax,
    })
}

fn load_key(path: &Path, mode: BuildMode, allow_generated: bool) -> Result<Key, SessionKeyError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            let min_len = match mode {
                BuildMode::Release => SESSION_KEY_MIN_LEN,
                BuildMode::Debug => DERIVE_MIN_LEN,
            };
            if length < min_len {
                bytes.zeroize();
                return Err(SessionKeyError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if allow_generated => {
            warn!(
                path = %path.display(),
                %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionKeyError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// First 8 bytes of the SHA-256 of the signing key, hex encoded.
///
/// Logged at start-up so operators can tell which key is live.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use backend::server::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
