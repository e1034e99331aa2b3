use thiserror::Error;

use crate::types::KeyPurpose;

/// Failure conditions of the crypto core.
///
/// Per-message failures (malformed payloads, failed authentication) are
/// ordinary values at every boundary; nothing here carries passphrases,
/// derived keys, or plaintext.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("payload has no delimited <...> span")]
    MissingDelimiter,

    #[error("payload span has no iv:ciphertext separator")]
    MissingSeparator,

    #[error("invalid base64 in payload: {0}")]
    InvalidBase64(String),

    #[error("invalid IV length: expected {expected} bytes, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("no derivation scheme produced a valid plaintext")]
    NoSchemeMatched,

    #[error("key is restricted to {restricted}, cannot {attempted}")]
    PurposeMismatch {
        restricted: KeyPurpose,
        attempted: KeyPurpose,
    },

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("random number generation failed: {0}")]
    RngFailed(String),

    #[error("no keys configured for origin {0}")]
    NoKeysConfigured(String),

    #[error("nothing to encrypt: input is empty")]
    EmptyPlaintext,

    #[error("text already carries an encrypted payload")]
    AlreadyEncrypted,

    #[error("key store serialization failed: {0}")]
    StoreSerialization(String),

    #[error("key store import expects a JSON object of origin patterns")]
    InvalidImport,
}

impl CryptoError {
    /// True for decode-level failures: the text was a candidate but does not
    /// hold a well-formed `<iv:ciphertext>` payload.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(
            self,
            CryptoError::MissingDelimiter
                | CryptoError::MissingSeparator
                | CryptoError::InvalidBase64(_)
                | CryptoError::InvalidIvLength { .. }
        )
    }
}
