use std::fmt;

/// Literal prefix marking a chat message as an encrypted payload.
/// Any text beginning with this (after trimming) is a candidate message.
pub const PAYLOAD_PREFIX: &str = "NebulaEncrypt:";

/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// Maximum number of derived keys held by the key cache.
pub const KEY_CACHE_CAPACITY: usize = 32;

/// Salt prefix for origin-bound derivation (current and v1 schemes).
pub const ORIGIN_SALT_PREFIX: &str = "NebulaEncrypt-v1-";

/// Fixed salt used by the oldest deployed derivation scheme.
pub const LEGACY_SALT: &str = "a-unique-salt";

/// PBKDF2 rounds for the current scheme.
pub const CURRENT_ITERATIONS: u32 = 210_000;

/// PBKDF2 rounds for the v1 and legacy schemes.
pub const LEGACY_ITERATIONS: u32 = 100_000;

/// Capability a derived key is restricted to. A key derived for one purpose
/// cannot be used for the other; see [`crate::kdf::DerivedKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPurpose {
    Encrypt,
    Decrypt,
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPurpose::Encrypt => f.write_str("encrypt"),
            KeyPurpose::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// How a derivation scheme builds its PBKDF2 salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltTemplate {
    /// Static prefix followed by the origin pattern.
    OriginBound { prefix: &'static str },
    /// Fixed literal, independent of origin.
    Fixed(&'static str),
}

/// One historical or current way of turning a passphrase into a key.
///
/// The payload carries no version tag; the scheme is discovered by trial
/// during decryption, in [`DERIVATION_SCHEMES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationScheme {
    pub name: &'static str,
    pub salt_template: SaltTemplate,
    pub iterations: u32,
}

impl DerivationScheme {
    /// Render the PBKDF2 salt for a given origin pattern.
    pub fn salt(&self, origin_pattern: &str) -> String {
        match self.salt_template {
            SaltTemplate::OriginBound { prefix } => format!("{}{}", prefix, origin_pattern),
            SaltTemplate::Fixed(salt) => salt.to_string(),
        }
    }
}

/// Ordered derivation schemes, newest first. Decryption tries each in turn;
/// encryption always uses the first entry. These definitions are load-bearing
/// for interoperability with already-sent messages.
///
/// v2 and v1 share a salt, and the key cache is keyed by (purpose, salt,
/// passphrase) only: whichever iteration count was derived first for a salt
/// wins for that salt while the entry stays cached.
pub const DERIVATION_SCHEMES: [DerivationScheme; 3] = [
    DerivationScheme {
        name: "v2",
        salt_template: SaltTemplate::OriginBound {
            prefix: ORIGIN_SALT_PREFIX,
        },
        iterations: CURRENT_ITERATIONS,
    },
    DerivationScheme {
        name: "v1",
        salt_template: SaltTemplate::OriginBound {
            prefix: ORIGIN_SALT_PREFIX,
        },
        iterations: LEGACY_ITERATIONS,
    },
    DerivationScheme {
        name: "legacy",
        salt_template: SaltTemplate::Fixed(LEGACY_SALT),
        iterations: LEGACY_ITERATIONS,
    },
];

/// Scheme used for all newly encrypted messages.
pub const CURRENT_SCHEME: DerivationScheme = DERIVATION_SCHEMES[0];
