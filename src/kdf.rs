//! PBKDF2-SHA256 passphrase derivation.
//!
//! A passphrase plus a salt and round count becomes a 256-bit AES-GCM key,
//! wrapped in a [`DerivedKey`] handle restricted to a single [`KeyPurpose`].
//! Derivation itself has no failure path; the raw key bytes are wiped as soon
//! as the cipher is built.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::types::{KeyPurpose, AES_GCM_IV_LENGTH, AES_KEY_LENGTH};

/// Opaque symmetric key handle, usable only for its declared purpose.
///
/// The restriction is enforced here, not by convention: an encryption key
/// cannot open ciphertext and a decryption key cannot seal plaintext.
pub struct DerivedKey {
    purpose: KeyPurpose,
    cipher: Aes256Gcm,
}

impl DerivedKey {
    pub fn purpose(&self) -> KeyPurpose {
        self.purpose
    }

    /// Encrypt `plaintext` under this key with the given IV (no AAD).
    pub fn seal(
        &self,
        iv: &[u8; AES_GCM_IV_LENGTH],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if self.purpose != KeyPurpose::Encrypt {
            return Err(CryptoError::PurposeMismatch {
                restricted: self.purpose,
                attempted: KeyPurpose::Encrypt,
            });
        }
        self.cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    /// Decrypt `ciphertext` under this key. The GCM tag check rejects wrong
    /// keys and corrupted data; both surface as [`CryptoError::DecryptionFailed`].
    pub fn open(
        &self,
        iv: &[u8; AES_GCM_IV_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if self.purpose != KeyPurpose::Decrypt {
            return Err(CryptoError::PurposeMismatch {
                restricted: self.purpose,
                attempted: KeyPurpose::Decrypt,
            });
        }
        self.cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

/// Derive a purpose-restricted AES-256-GCM key from a passphrase.
///
/// PBKDF2 over the UTF-8 passphrase, UTF-8 salt, SHA-256, `iterations` rounds.
pub fn derive_key(
    passphrase: &str,
    salt: &str,
    purpose: KeyPurpose,
    iterations: u32,
) -> DerivedKey {
    let mut okm = [0u8; AES_KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt.as_bytes(), iterations, &mut okm);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&okm));
    okm.zeroize();
    DerivedKey { purpose, cipher }
}
