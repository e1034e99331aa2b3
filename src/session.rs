//! Host-facing surface binding one origin's keys to an engine.
//!
//! The extension's scanning glue supplies `(raw text, direction)` pairs and
//! outgoing compose text; everything DOM-shaped stays on that side of the
//! boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::engine::CryptoEngine;
use crate::error::CryptoError;
use crate::keystore::{KeyRecord, KeyStore};
use crate::payload::is_encrypted_text;

/// Which conversation party authored a message, selecting the passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Messages this user sends; uses the outgoing passphrase.
    Outgoing,
    /// Messages the peer sends; uses the incoming passphrase.
    Incoming,
}

/// One origin's keys bound to a shared [`CryptoEngine`].
pub struct OriginSession {
    engine: Arc<CryptoEngine>,
    keys: KeyRecord,
    decrypted: AtomicU64,
}

impl OriginSession {
    pub fn new(engine: Arc<CryptoEngine>, keys: KeyRecord) -> Self {
        Self {
            engine,
            keys,
            decrypted: AtomicU64::new(0),
        }
    }

    /// Bind the store's record for `origin_pattern`, or report
    /// [`CryptoError::NoKeysConfigured`] so the host can prompt for setup.
    pub fn open(
        engine: Arc<CryptoEngine>,
        store: &KeyStore,
        origin_pattern: &str,
    ) -> Result<Self, CryptoError> {
        let keys = store.require(origin_pattern)?;
        Ok(Self::new(engine, keys))
    }

    pub fn origin_pattern(&self) -> &str {
        &self.keys.origin_pattern
    }

    fn passphrase(&self, direction: Direction) -> &str {
        match direction {
            Direction::Outgoing => &self.keys.outgoing_passphrase,
            Direction::Incoming => &self.keys.incoming_passphrase,
        }
    }

    /// Encrypt compose-field text under the outgoing passphrase.
    ///
    /// Rejects empty input and text that already carries a payload, so a
    /// double-press of the encrypt shortcut cannot wrap a message twice.
    pub fn encrypt_outgoing(&self, text: &str) -> Result<String, CryptoError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CryptoError::EmptyPlaintext);
        }
        if is_encrypted_text(trimmed) {
            return Err(CryptoError::AlreadyEncrypted);
        }
        self.engine.encrypt(
            trimmed,
            &self.keys.outgoing_passphrase,
            &self.keys.origin_pattern,
        )
    }

    /// Decrypt one scanned message; `None` is the per-message failure signal.
    ///
    /// Non-candidates (already-decrypted text included) and undecryptable
    /// candidates both yield `None` so the scan loop renders them untouched.
    pub fn decrypt_message(&self, raw_text: &str, direction: Direction) -> Option<String> {
        if !is_encrypted_text(raw_text) {
            return None;
        }
        match self.engine.decrypt(
            raw_text,
            self.passphrase(direction),
            &self.keys.origin_pattern,
        ) {
            Ok(plaintext) => {
                self.decrypted.fetch_add(1, Ordering::Relaxed);
                Some(plaintext)
            }
            Err(_) => None,
        }
    }

    /// Decrypt a whole scan pass. One undecryptable message never aborts the
    /// rest; the result keeps input order with `None` holes for failures.
    pub fn decrypt_batch<'a, I>(&self, messages: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = (&'a str, Direction)>,
    {
        let results: Vec<Option<String>> = messages
            .into_iter()
            .map(|(raw_text, direction)| self.decrypt_message(raw_text, direction))
            .collect();
        let decrypted = results.iter().filter(|r| r.is_some()).count();
        debug!(
            origin = %self.keys.origin_pattern,
            scanned = results.len(),
            decrypted,
            "scan pass complete"
        );
        results
    }

    /// Messages decrypted through this session so far (the host's badge count).
    pub fn decrypted_count(&self) -> u64 {
        self.decrypted.load(Ordering::Relaxed)
    }
}
