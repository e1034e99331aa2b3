//! Per-origin passphrase records and their persistence schema.
//!
//! The external key-value store persists a single record under the well-known
//! key [`STORAGE_KEY`]: a JSON object mapping a normalized origin pattern to
//! `{ "myKey": <outgoing>, "peerKey": <incoming> }`. This module owns that
//! shape; no other component reads or writes it directly.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Well-known key the host's key-value store persists the mapping under.
pub const STORAGE_KEY: &str = "urlKeys";

/// Passphrase pair for one chat service origin.
///
/// `origin_pattern` must be the canonical `scheme://host/` form. Lookups and
/// writes use it verbatim: two spellings of the same origin are distinct
/// records unless the caller normalizes first (see
/// [`normalize_origin_pattern`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub origin_pattern: String,
    /// Passphrase for messages this user sends.
    pub outgoing_passphrase: String,
    /// Passphrase for messages the peer sends.
    pub incoming_passphrase: String,
}

impl Drop for KeyRecord {
    fn drop(&mut self) {
        self.outgoing_passphrase.zeroize();
        self.incoming_passphrase.zeroize();
    }
}

/// Persisted value shape for one origin.
#[derive(Serialize, Deserialize)]
struct PassphrasePair {
    #[serde(rename = "myKey")]
    my_key: String,
    #[serde(rename = "peerKey")]
    peer_key: String,
}

/// Trim and enforce the trailing slash on an origin pattern.
///
/// Sharp edge: this does not parse URLs. The caller must already pass
/// `scheme://host` with consistent casing; anything else produces a distinct
/// store key.
pub fn normalize_origin_pattern(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// In-memory origin → passphrase-pair mapping, at most one record per origin.
///
/// Mutations are guarded so interleaved scan passes cannot corrupt the list.
/// "Not found" is an ordinary absent result, not an error.
pub struct KeyStore {
    records: Mutex<Vec<KeyRecord>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Record for an origin pattern, if configured.
    pub fn get(&self, origin_pattern: &str) -> Option<KeyRecord> {
        let records = self.records.lock();
        records
            .iter()
            .find(|r| r.origin_pattern == origin_pattern)
            .cloned()
    }

    /// Like [`KeyStore::get`], but absent keys become
    /// [`CryptoError::NoKeysConfigured`] so the host can prompt for setup
    /// instead of treating this as a decryption failure.
    pub fn require(&self, origin_pattern: &str) -> Result<KeyRecord, CryptoError> {
        self.get(origin_pattern)
            .ok_or_else(|| CryptoError::NoKeysConfigured(origin_pattern.to_string()))
    }

    /// Upsert. Replaces any existing record for the same origin pattern in
    /// place, preserving its position in the listing order.
    pub fn put(&self, record: KeyRecord) {
        let mut records = self.records.lock();
        match records
            .iter_mut()
            .find(|r| r.origin_pattern == record.origin_pattern)
        {
            Some(existing) => {
                debug!(origin = %record.origin_pattern, "replaced key record");
                *existing = record;
            }
            None => {
                debug!(origin = %record.origin_pattern, "saved key record");
                records.push(record);
            }
        }
    }

    /// Remove the record for an origin pattern. Returns whether one existed.
    pub fn delete(&self, origin_pattern: &str) -> bool {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.origin_pattern != origin_pattern);
        let deleted = records.len() < before;
        if deleted {
            debug!(origin = origin_pattern, "deleted key record");
        }
        deleted
    }

    /// All records, in insertion order.
    pub fn list(&self) -> Vec<KeyRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Serialize the full mapping in the persisted schema, in store order.
    pub fn export_json(&self) -> Result<String, CryptoError> {
        let records = self.records.lock();
        let mut map = serde_json::Map::with_capacity(records.len());
        for record in records.iter() {
            let pair = PassphrasePair {
                my_key: record.outgoing_passphrase.clone(),
                peer_key: record.incoming_passphrase.clone(),
            };
            let value = serde_json::to_value(pair)
                .map_err(|e| CryptoError::StoreSerialization(e.to_string()))?;
            map.insert(record.origin_pattern.clone(), value);
        }
        serde_json::to_string(&map).map_err(|e| CryptoError::StoreSerialization(e.to_string()))
    }

    /// Merge records from exported JSON; imported entries overwrite existing
    /// records for the same origin. Returns the number of imported records.
    ///
    /// Rejects anything that is not a JSON object of
    /// `origin → {myKey, peerKey}` entries.
    pub fn import_json(&self, json: &str) -> Result<usize, CryptoError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| CryptoError::StoreSerialization(e.to_string()))?;
        let map = match value {
            serde_json::Value::Object(map) => map,
            _ => return Err(CryptoError::InvalidImport),
        };

        let mut imported = Vec::with_capacity(map.len());
        for (origin_pattern, entry) in map {
            let pair: PassphrasePair =
                serde_json::from_value(entry).map_err(|_| CryptoError::InvalidImport)?;
            imported.push(KeyRecord {
                origin_pattern,
                outgoing_passphrase: pair.my_key,
                incoming_passphrase: pair.peer_key,
            });
        }

        let count = imported.len();
        for record in imported {
            self.put(record);
        }
        debug!(count, "imported key records");
        Ok(count)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
