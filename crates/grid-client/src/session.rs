//! # Session Secrets
//!
//! Ephemeral signing material derived when the client is initialized.
//! The HTTP transport signs every JSON body with it.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Per-process session identity and signing key
#[derive(Clone, PartialEq)]
pub struct SessionSecrets {
    session_id: Uuid,
    signing_key: String,
    created_at: DateTime<Utc>,
}

impl SessionSecrets {
    /// Derive a fresh session from the API key.
    ///
    /// `signing_key = hex(HMAC-SHA256(api_key, session_id))`
    pub fn generate(api_key: &str) -> Self {
        let session_id = Uuid::new_v4();
        let signing_key = compute_hmac_sha256(api_key.as_bytes(), session_id.as_bytes());

        Self {
            session_id,
            signing_key,
            created_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Hex HMAC-SHA256 of `payload` under the session key
    pub fn sign(&self, payload: &[u8]) -> String {
        compute_hmac_sha256(self.signing_key.as_bytes(), payload)
    }

    /// Check a signature produced by [`SessionSecrets::sign`] (constant-time)
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        constant_time_compare(&self.sign(payload), signature)
    }
}

impl fmt::Debug for SessionSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSecrets")
            .field("session_id", &self.session_id)
            .field("signing_key", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

fn compute_hmac_sha256(key: &[u8], message: &[u8]) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
