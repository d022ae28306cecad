use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::storage::{Clock, SessionStorage};
use crate::crypto::{aes, session};

/// Storage entry holding base64(nonce || ciphertext).
const KEY_BLOB: &str = "crisper_secure_key";
/// Storage entry holding the millisecond refresh timestamp.
const KEY_TIMESTAMP: &str = "crisper_key_ts";
/// Storage entry holding the random per-session identifier.
const KEY_SESSION_ID: &str = "crisper_session_id";

/// Idle timeout for the stored credential (30 minutes).
const KEY_EXPIRY_MS: i64 = 30 * 60 * 1000;

/// Holds the upstream API credential for one session, encrypted at rest.
///
/// The encryption key is rederived on every access from the session
/// identifier, so the ciphertext is worthless without the session-scoped
/// storage it lives next to. This is obfuscation against casual inspection
/// plus automatic forgetting, not a defense against a compromised client;
/// the production deployment never hands the credential to the client at all.
#[derive(Clone)]
pub struct SessionKeyStore {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    fingerprint: String,
}

impl SessionKeyStore {
    /// Creates a new `SessionKeyStore`.
    ///
    /// # Arguments
    ///
    /// * `storage` - The session-scoped storage backend.
    /// * `clock` - The time source used for expiry checks.
    /// * `fingerprint` - A coarse client fingerprint mixed into key derivation.
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        clock: Arc<dyn Clock>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            clock,
            fingerprint: fingerprint.into(),
        }
    }

    /// Encrypts and stores a credential, refreshing the expiry countdown.
    ///
    /// # Arguments
    ///
    /// * `plaintext_key` - The raw upstream API credential.
    ///
    /// # Returns
    ///
    /// `true` on success, `false` only on encryption failure.
    pub async fn save(&self, plaintext_key: &str) -> bool {
        let session_id = self.get_or_create_session_id().await;

        let sealed = session::derive_session_key(&session_id, &self.fingerprint)
            .and_then(|key| aes::seal(&key, plaintext_key.as_bytes()));

        let blob = match sealed {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!("Failed to encrypt session credential: {}", e);
                return false;
            }
        };

        self.storage
            .set(KEY_BLOB, general_purpose::STANDARD.encode(blob))
            .await;
        self.storage
            .set(KEY_TIMESTAMP, self.now_millis().to_string())
            .await;

        tracing::debug!("Session credential saved");
        true
    }

    /// Decrypts and returns the stored credential.
    ///
    /// Expired credentials are erased and reported as absent. Any decryption
    /// failure (tampered storage, lost session identifier) is also reported
    /// as absent rather than raised: either way the caller must prompt for a
    /// new credential.
    pub async fn get(&self) -> Option<Zeroizing<String>> {
        if self.is_expired().await {
            self.clear().await;
            return None;
        }

        let encoded = self.storage.get(KEY_BLOB).await?;
        let session_id = self.storage.get(KEY_SESSION_ID).await?;

        let blob = general_purpose::STANDARD.decode(encoded).ok()?;
        let key = session::derive_session_key(&session_id, &self.fingerprint).ok()?;
        let plaintext = match aes::open(&key, &blob) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!("Session credential unreadable, treating as absent: {}", e);
                return None;
            }
        };

        String::from_utf8(plaintext).ok().map(Zeroizing::new)
    }

    /// Expiry-aware existence check. Does not decrypt.
    pub async fn has_valid(&self) -> bool {
        if self.is_expired().await {
            self.clear().await;
            return false;
        }
        self.storage.get(KEY_BLOB).await.is_some()
    }

    /// Resets the idle-timeout countdown without touching the ciphertext.
    /// Called after every successful use of the credential.
    pub async fn refresh(&self) {
        if self.storage.get(KEY_BLOB).await.is_some() {
            self.storage
                .set(KEY_TIMESTAMP, self.now_millis().to_string())
                .await;
        }
    }

    /// Erases ciphertext, timestamp, and session identifier. Idempotent.
    pub async fn clear(&self) {
        self.storage.remove(KEY_BLOB).await;
        self.storage.remove(KEY_TIMESTAMP).await;
        self.storage.remove(KEY_SESSION_ID).await;
    }

    /// Minutes until the stored credential expires, for UI display.
    pub async fn remaining_minutes(&self) -> u64 {
        let Some(saved) = self.saved_millis().await else {
            return 0;
        };

        let remaining = KEY_EXPIRY_MS - (self.now_millis() - saved);
        if remaining <= 0 {
            0
        } else {
            (remaining as u64).div_ceil(60_000)
        }
    }

    async fn is_expired(&self) -> bool {
        match self.saved_millis().await {
            Some(saved) => self.now_millis() - saved > KEY_EXPIRY_MS,
            None => true,
        }
    }

    async fn saved_millis(&self) -> Option<i64> {
        self.storage
            .get(KEY_TIMESTAMP)
            .await
            .and_then(|ts| ts.parse().ok())
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    async fn get_or_create_session_id(&self) -> String {
        if let Some(id) = self.storage.get(KEY_SESSION_ID).await {
            return id;
        }
        let id = Uuid::new_v4().to_string();
        self.storage.set(KEY_SESSION_ID, id.clone()).await;
        id
    }
}
