//! Session management
//!
//! The session record lives entirely in the `github_session` cookie.
//! With a configured secret the record is sealed with AES-256-GCM under
//! `SHA-256(secret)`; without one it is only base64-encoded.
//! No server-side session storage needed.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

const AES_GCM_NONCE_BYTES: usize = 12;
const AES_GCM_TAG_BYTES: usize = 16;
const ENVELOPE_ALGORITHM: &str = "A256GCM";

/// User session data
///
/// Created by the OAuth callback and serialized into the session cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// GitHub login
    pub username: String,
    /// Display name from GitHub profile
    pub display_name: Option<String>,
    /// Avatar URL from GitHub
    pub avatar_url: String,
    /// GitHub user ID
    pub user_id: u64,
    /// OAuth access token; never leaves the server in a response body
    pub access_token: String,
    /// When the session was issued
    pub issued_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("avatar_url", &self.avatar_url)
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl Session {
    /// Check whether the session is older than `max_age_secs`
    pub fn is_expired(&self, max_age_secs: i64) -> bool {
        self.issued_at + Duration::seconds(max_age_secs) < Utc::now()
    }

    /// Public view of the session, without the access token
    pub fn user(&self) -> SessionUser {
        SessionUser {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            user_id: self.user_id,
            issued_at: self.issued_at,
        }
    }
}

/// Session fields safe to return to the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: String,
    pub user_id: u64,
    pub issued_at: DateTime<Utc>,
}

/// Sealed session as stored in the cookie
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    alg: String,
    iv: String,
    tag: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Sealed(Envelope),
    Plain(Session),
}

/// Encodes and decodes session cookies
///
/// Cookie format: base64url(JSON), where the JSON is either an
/// [`Envelope`] (secret configured) or the bare [`Session`].
#[derive(Clone)]
pub struct SessionCodec {
    cipher: Option<Aes256Gcm>,
}

impl SessionCodec {
    /// Build a codec; `None` selects the unencrypted fallback.
    pub fn new(secret: Option<&str>) -> Result<Self, AppError> {
        let cipher = secret
            .map(|secret| {
                let key = Sha256::digest(secret.as_bytes());
                Aes256Gcm::new_from_slice(&key)
                    .map_err(|_| AppError::Encryption("invalid session key length".to_string()))
            })
            .transpose()?;

        Ok(Self { cipher })
    }

    /// Whether cookies produced by this codec are encrypted
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Encode a session into a cookie value
    ///
    /// # Errors
    /// Returns error if serialization or encryption fails
    pub fn encode(&self, session: &Session) -> Result<String, AppError> {
        let json = serde_json::to_vec(session).map_err(|e| AppError::Internal(e.into()))?;

        let Some(cipher) = &self.cipher else {
            return Ok(URL_SAFE_NO_PAD.encode(json));
        };

        let mut nonce = [0_u8; AES_GCM_NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);
        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), json.as_slice())
            .map_err(|_| AppError::Encryption("session encryption failed".to_string()))?;
        let tag = sealed.split_off(sealed.len() - AES_GCM_TAG_BYTES);

        let envelope = Envelope {
            alg: ENVELOPE_ALGORITHM.to_string(),
            iv: URL_SAFE_NO_PAD.encode(nonce),
            tag: URL_SAFE_NO_PAD.encode(tag),
            data: URL_SAFE_NO_PAD.encode(sealed),
        };
        let envelope_json =
            serde_json::to_vec(&envelope).map_err(|e| AppError::Internal(e.into()))?;

        Ok(URL_SAFE_NO_PAD.encode(envelope_json))
    }

    /// Decode a cookie value back into a session
    ///
    /// Returns `None` for anything malformed, tampered with, or sealed
    /// in a mode this codec is not configured for. Expiry is not checked.
    pub fn decode(&self, value: &str) -> Option<Session> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        let payload: Payload = serde_json::from_slice(&bytes).ok()?;

        match (payload, &self.cipher) {
            (Payload::Sealed(envelope), Some(cipher)) => open(cipher, &envelope),
            (Payload::Plain(session), None) => Some(session),
            (Payload::Sealed(_), None) => {
                tracing::debug!("Encrypted session cookie received but no session secret is set");
                None
            }
            (Payload::Plain(_), Some(_)) => {
                tracing::warn!("Rejecting unencrypted session cookie");
                None
            }
        }
    }
}

fn open(cipher: &Aes256Gcm, envelope: &Envelope) -> Option<Session> {
    if envelope.alg != ENVELOPE_ALGORITHM {
        return None;
    }

    let nonce = URL_SAFE_NO_PAD.decode(&envelope.iv).ok()?;
    let tag = URL_SAFE_NO_PAD.decode(&envelope.tag).ok()?;
    let mut sealed = URL_SAFE_NO_PAD.decode(&envelope.data).ok()?;
    if nonce.len() != AES_GCM_NONCE_BYTES || tag.len() != AES_GCM_TAG_BYTES {
        return None;
    }

    sealed.extend_from_slice(&tag);
    let json = cipher
        .decrypt(Nonce::from_slice(&nonce), sealed.as_slice())
        .ok()?;
    serde_json::from_slice(&json).ok()
}
