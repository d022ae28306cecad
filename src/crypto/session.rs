use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use super::aes::{SecureKey, KEY_SIZE};
use crate::error::Result;

/// The fixed PBKDF2 salt. Versioned so a future change invalidates old blobs.
const KDF_SALT: &[u8] = b"crisper-salt-v1";
/// PBKDF2-HMAC-SHA256 iteration count.
const KDF_ITERATIONS: u32 = 100_000;
/// How many characters of the client fingerprint feed the derivation.
const FINGERPRINT_CHARS: usize = 20;

/// Derives the session encryption key from the random session identifier
/// and a coarse client fingerprint.
///
/// The key is never stored anywhere; it is rederived on demand, so the
/// ciphertext at rest is useless once the session identifier is gone.
///
/// # Arguments
///
/// * `session_id` - The per-session random identifier.
/// * `fingerprint` - A coarse client fingerprint (e.g. a user-agent string).
///
/// # Returns
///
/// A `SecureKey` that zeroizes on drop.
pub fn derive_session_key(session_id: &str, fingerprint: &str) -> Result<SecureKey> {
    let mut material = String::with_capacity(session_id.len() + FINGERPRINT_CHARS);
    material.push_str(session_id);
    material.extend(fingerprint.chars().take(FINGERPRINT_CHARS));

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(material.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key);

    material.zeroize();
    Ok(SecureKey::new(key))
}
