//! Candidate-message classification for scan loops.

use crate::payload::{self, EncryptedPayload};

/// Result of [`classify`]: whether the text is a candidate encrypted message,
/// and its decoded payload when the candidate is well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_candidate: bool,
    pub payload: Option<EncryptedPayload>,
}

/// Cheap gate + decode in one call.
///
/// The prefix check rejects the overwhelming majority of chat messages before
/// any base64 work. A candidate with a malformed payload still classifies as a
/// candidate, with `payload: None`.
pub fn classify(raw_text: &str) -> Classification {
    if !payload::is_encrypted_text(raw_text) {
        return Classification {
            is_candidate: false,
            payload: None,
        };
    }
    Classification {
        is_candidate: true,
        payload: payload::decode(raw_text).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::encode;
    use crate::types::AES_GCM_IV_LENGTH;

    #[test]
    fn plain_text_is_not_a_candidate() {
        let c = classify("hello");
        assert!(!c.is_candidate);
        assert!(c.payload.is_none());
    }

    #[test]
    fn decrypted_output_never_reclassifies() {
        // Plaintext coming out of decryption lacks the prefix, so a rescan
        // of an already-decrypted message is a no-op.
        let c = classify("see you at 6");
        assert!(!c.is_candidate);
    }

    #[test]
    fn well_formed_candidate() {
        let text = encode(&[1u8; AES_GCM_IV_LENGTH], &[9, 8, 7]);
        let c = classify(&text);
        assert!(c.is_candidate);
        let payload = c.payload.unwrap();
        assert_eq!(payload.iv, [1u8; AES_GCM_IV_LENGTH]);
        assert_eq!(payload.ciphertext, vec![9, 8, 7]);
    }

    #[test]
    fn candidate_with_malformed_payload() {
        let c = classify("NebulaEncrypt:<garbage>");
        assert!(c.is_candidate);
        assert!(c.payload.is_none());
    }

    #[test]
    fn whitespace_does_not_hide_a_candidate() {
        let text = format!("  {}  ", encode(&[2u8; AES_GCM_IV_LENGTH], &[1]));
        let c = classify(&text);
        assert!(c.is_candidate);
        assert!(c.payload.is_some());
    }
}
