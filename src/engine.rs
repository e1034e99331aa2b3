//! Encrypt/decrypt orchestration with ordered multi-version fallback.

use tracing::debug;

use crate::error::CryptoError;
use crate::key_cache::KeyDerivation;
use crate::payload;
use crate::types::{KeyPurpose, AES_GCM_IV_LENGTH, CURRENT_SCHEME, DERIVATION_SCHEMES};

/// Stateless encrypt/decrypt front end over an owned [`KeyDerivation`].
///
/// Encryption always uses the current scheme. Decryption tries every scheme in
/// [`DERIVATION_SCHEMES`] order, newest first, so messages sealed under older
/// derivation rules stay readable without a version tag in the payload.
pub struct CryptoEngine {
    derivation: KeyDerivation,
}

impl CryptoEngine {
    pub fn new() -> Self {
        Self::with_derivation(KeyDerivation::new())
    }

    /// Build an engine around an existing derivation cache.
    pub fn with_derivation(derivation: KeyDerivation) -> Self {
        Self { derivation }
    }

    /// Encrypt `plaintext` for `origin_pattern` under `passphrase`.
    ///
    /// Generates a fresh random 12-byte IV per message; the output always
    /// begins `NebulaEncrypt:<` and decrypts back with the same passphrase and
    /// origin. An unavailable RNG is fatal and surfaced as [`CryptoError::RngFailed`].
    pub fn encrypt(
        &self,
        plaintext: &str,
        passphrase: &str,
        origin_pattern: &str,
    ) -> Result<String, CryptoError> {
        let mut iv = [0u8; AES_GCM_IV_LENGTH];
        getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;

        let salt = CURRENT_SCHEME.salt(origin_pattern);
        let key = self.derivation.derive(
            passphrase,
            &salt,
            KeyPurpose::Encrypt,
            CURRENT_SCHEME.iterations,
        );
        let ciphertext = key.seal(&iv, plaintext.as_bytes())?;
        Ok(payload::encode(&iv, &ciphertext))
    }

    /// Decrypt a payload-bearing text, trying each derivation scheme in turn.
    ///
    /// Malformed payloads return immediately, before any derivation. A scheme
    /// succeeds only if the GCM tag verifies and the plaintext is valid UTF-8;
    /// exhausting the list yields [`CryptoError::NoSchemeMatched`]. Wrong
    /// passphrases and corrupted ciphertext are indistinguishable here by
    /// design.
    pub fn decrypt(
        &self,
        text: &str,
        passphrase: &str,
        origin_pattern: &str,
    ) -> Result<String, CryptoError> {
        let payload = payload::decode(text)?;

        for scheme in &DERIVATION_SCHEMES {
            let salt = scheme.salt(origin_pattern);
            let key =
                self.derivation
                    .derive(passphrase, &salt, KeyPurpose::Decrypt, scheme.iterations);
            let plaintext = match key.open(&payload.iv, &payload.ciphertext) {
                Ok(bytes) => bytes,
                Err(_) => continue,
            };
            match String::from_utf8(plaintext) {
                Ok(text) => {
                    debug!(scheme = scheme.name, origin = origin_pattern, "decrypted message");
                    return Ok(text);
                }
                Err(_) => continue,
            }
        }

        debug!(origin = origin_pattern, "no derivation scheme matched");
        Err(CryptoError::NoSchemeMatched)
    }

    /// PBKDF2 runs performed by this engine's cache so far.
    pub fn derivation_count(&self) -> u64 {
        self.derivation.derivation_count()
    }
}

impl Default for CryptoEngine {
    fn default() -> Self {
        Self::new()
    }
}
