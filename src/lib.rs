//! End-to-end message encryption for NebulaEncrypt.
//!
//! This crate provides pure-Rust implementations of:
//! - PBKDF2-SHA256 passphrase derivation with a bounded key cache
//! - The `NebulaEncrypt:<b64iv:b64ciphertext>` text wire format
//! - AES-256-GCM encrypt/decrypt with ordered multi-version fallback
//! - Candidate-message classification for scan loops
//! - The per-origin key store (`urlKeys` schema) and its export/import
//!
//! DOM scraping, extension message passing, the popup UI, and the persistence
//! mechanics of the key-value store stay in the extension's JavaScript host.

pub mod classifier;
pub mod engine;
pub mod error;
pub mod kdf;
pub mod key_cache;
pub mod keystore;
pub mod payload;
pub mod session;
pub mod types;

pub use classifier::{classify, Classification};
pub use engine::CryptoEngine;
pub use error::CryptoError;
pub use kdf::{derive_key, DerivedKey};
pub use key_cache::KeyDerivation;
pub use keystore::{normalize_origin_pattern, KeyRecord, KeyStore, STORAGE_KEY};
pub use payload::{decode, encode, is_encrypted_text, EncryptedPayload};
pub use session::{Direction, OriginSession};
pub use types::{
    DerivationScheme, KeyPurpose, SaltTemplate, AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH,
    AES_KEY_LENGTH, CURRENT_SCHEME, DERIVATION_SCHEMES, KEY_CACHE_CAPACITY, PAYLOAD_PREFIX,
};
