//! Signed, time-bounded OAuth `state` tokens
//!
//! A token is `BASE64URL(claims_json) "." HEX(mac)` where the MAC is a BLAKE3
//! keyed hash of the encoded claims. The key is derived from the configured
//! secret, so rotating the secret invalidates every outstanding token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use pslang_domain::constants::MIN_STATE_SECRET_LENGTH;
use pslang_domain::{ChatProvider, PsLangError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

const KEY_CONTEXT: &str = "pslang 2024 oauth state token v1";
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Claims carried by a state token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClaims {
    #[serde(rename = "uid")]
    pub user_id: String,
    #[serde(rename = "prv")]
    pub provider: ChatProvider,
    /// Issue time, Unix seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    pub nonce: String,
}

/// Issues and verifies state tokens.
pub struct StateSigner {
    key: [u8; 32],
    ttl: Duration,
}

impl StateSigner {
    /// Create a signer from a configured secret.
    ///
    /// # Errors
    /// `Config` when the secret is shorter than the minimum length or the TTL
    /// is not positive.
    pub fn new(secret: &str, ttl_seconds: i64) -> Result<Self> {
        if secret.len() < MIN_STATE_SECRET_LENGTH {
            return Err(PsLangError::Config(format!(
                "oauth state secret must be at least {MIN_STATE_SECRET_LENGTH} bytes"
            )));
        }
        if ttl_seconds <= 0 {
            return Err(PsLangError::Config("oauth state TTL must be positive".into()));
        }

        Ok(Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            ttl: Duration::seconds(ttl_seconds),
        })
    }

    /// Issue a token for `(user_id, provider)`.
    pub fn issue(&self, user_id: &str, provider: ChatProvider, now: DateTime<Utc>) -> Result<String> {
        let nonce: [u8; 16] = rand::thread_rng().gen();
        let claims = StateClaims {
            user_id: user_id.to_string(),
            provider,
            issued_at: now.timestamp(),
            nonce: hex::encode(nonce),
        };

        let json = serde_json::to_vec(&claims)
            .map_err(|e| PsLangError::Internal(format!("failed to encode state claims: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mac = blake3::keyed_hash(&self.key, payload.as_bytes());

        Ok(format!("{payload}.{}", mac.to_hex()))
    }

    /// Verify a token received on callback for `provider`.
    ///
    /// # Errors
    /// `BadRequest` for a malformed, forged, expired or cross-provider token.
    pub fn verify(
        &self,
        token: &str,
        provider: ChatProvider,
        now: DateTime<Utc>,
    ) -> Result<StateClaims> {
        let (payload, mac_hex) =
            token.split_once('.').ok_or_else(|| invalid("malformed state token"))?;

        let mac = blake3::Hash::from_hex(mac_hex).map_err(|_| invalid("malformed state token"))?;
        // blake3::Hash equality is constant time.
        if blake3::keyed_hash(&self.key, payload.as_bytes()) != mac {
            return Err(invalid("state token signature mismatch"));
        }

        let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid("malformed state token"))?;
        let claims: StateClaims =
            serde_json::from_slice(&json).map_err(|_| invalid("malformed state token"))?;

        let age = now.timestamp() - claims.issued_at;
        if age > self.ttl.num_seconds() {
            return Err(invalid("state token expired"));
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(invalid("state token issued in the future"));
        }
        if claims.provider != provider {
            return Err(invalid("state token issued for a different provider"));
        }
        if claims.user_id.is_empty() {
            return Err(invalid("state token carries no user"));
        }

        Ok(claims)
    }
}

fn invalid(reason: &str) -> PsLangError {
    PsLangError::BadRequest(reason.to_string())
}
