//! Text wire format for encrypted messages.
//!
//! A payload travels as the entire content of an ordinary chat message:
//! `NebulaEncrypt:<BASE64_IV:BASE64_CIPHERTEXT>`
//! Standard base64 alphabet with padding for both fields; the IV is always
//! exactly 12 bytes; the ciphertext carries the GCM tag. Surrounding junk the
//! host UI appends (timestamps, read markers) is tolerated as long as the
//! `<...>` span is intact.

use base64ct::{Base64, Encoding};

use crate::error::CryptoError;
use crate::types::{AES_GCM_IV_LENGTH, PAYLOAD_PREFIX};

/// Decoded wire value: the AES-GCM IV and the tagged ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub iv: [u8; AES_GCM_IV_LENGTH],
    pub ciphertext: Vec<u8>,
}

/// Serialize an IV + ciphertext pair into the message text format.
pub fn encode(iv: &[u8; AES_GCM_IV_LENGTH], ciphertext: &[u8]) -> String {
    format!(
        "{}<{}:{}>",
        PAYLOAD_PREFIX,
        Base64::encode_string(iv),
        Base64::encode_string(ciphertext)
    )
}

/// True iff the text (after trimming surrounding whitespace) starts with the
/// payload prefix. This gate runs before any decode or decrypt attempt.
pub fn is_encrypted_text(text: &str) -> bool {
    text.trim().starts_with(PAYLOAD_PREFIX)
}

/// Parse the first non-empty `<...>` span of `text` into a payload.
///
/// The separator is the first `:` inside the span and must sit at index 1 or
/// later (an empty IV field is invalid). Empty `<>` spans are skipped and the
/// scan continues. Every failure is a distinct [`CryptoError`] value; this
/// never panics on untrusted input.
pub fn decode(text: &str) -> Result<EncryptedPayload, CryptoError> {
    let span = delimited_span(text).ok_or(CryptoError::MissingDelimiter)?;

    let sep = span.find(':').ok_or(CryptoError::MissingSeparator)?;
    if sep == 0 {
        return Err(CryptoError::MissingSeparator);
    }

    let iv_bytes = Base64::decode_vec(&span[..sep])
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
    let ciphertext = Base64::decode_vec(&span[sep + 1..])
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;

    let iv: [u8; AES_GCM_IV_LENGTH] =
        iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidIvLength {
                expected: AES_GCM_IV_LENGTH,
                got: iv_bytes.len(),
            })?;

    Ok(EncryptedPayload { iv, ciphertext })
}

/// First `<...>` span with at least one character between the brackets.
fn delimited_span(text: &str) -> Option<&str> {
    let mut from = 0;
    while let Some(rel) = text[from..].find('<') {
        let open = from + rel;
        let close = open + 1 + text[open + 1..].find('>')?;
        if close > open + 1 {
            return Some(&text[open + 1..close]);
        }
        from = close;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_iv() -> [u8; AES_GCM_IV_LENGTH] {
        [7u8; AES_GCM_IV_LENGTH]
    }

    #[test]
    fn encode_decode_round_trip() {
        let text = encode(&sample_iv(), &[1, 2, 3, 4, 5]);
        let payload = decode(&text).unwrap();
        assert_eq!(payload.iv, sample_iv());
        assert_eq!(payload.ciphertext, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn encode_shape() {
        let text = encode(&sample_iv(), b"ciphertext");
        assert!(text.starts_with("NebulaEncrypt:<"));
        assert!(text.ends_with('>'));
        assert_eq!(text.matches(':').count(), 2);
    }

    #[test]
    fn prefix_gate() {
        assert!(!is_encrypted_text("hello"));
        assert!(is_encrypted_text("NebulaEncrypt:<AAAA:BBBB>"));
        assert!(is_encrypted_text("  NebulaEncrypt:<x:y>  "));
        assert!(!is_encrypted_text("prefix NebulaEncrypt:<x:y>"));
    }

    #[test]
    fn tolerates_trailing_junk() {
        let mut text = encode(&sample_iv(), &[9, 9, 9]);
        text.push_str(" 12:34 PM");
        assert!(decode(&text).is_ok());
    }

    #[test]
    fn skips_empty_span() {
        let payload_text = encode(&sample_iv(), &[1, 2, 3]);
        let text = format!("<>{}", payload_text);
        assert!(decode(&text).is_ok());
    }

    #[test]
    fn rejects_missing_span() {
        assert!(matches!(
            decode("NebulaEncrypt: no brackets"),
            Err(CryptoError::MissingDelimiter)
        ));
        assert!(matches!(
            decode("NebulaEncrypt:<never closed"),
            Err(CryptoError::MissingDelimiter)
        ));
    }

    #[test]
    fn rejects_missing_or_leading_separator() {
        assert!(matches!(
            decode("NebulaEncrypt:<AAAA>"),
            Err(CryptoError::MissingSeparator)
        ));
        assert!(matches!(
            decode("NebulaEncrypt:<:AAAA>"),
            Err(CryptoError::MissingSeparator)
        ));
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            decode("NebulaEncrypt:<!!!!:AAAA>"),
            Err(CryptoError::InvalidBase64(_))
        ));
    }

    #[test]
    fn rejects_wrong_iv_length() {
        for len in [11usize, 13] {
            let iv_b64 = Base64::encode_string(&vec![0u8; len]);
            let ct_b64 = Base64::encode_string(&[1, 2, 3]);
            let text = format!("NebulaEncrypt:<{}:{}>", iv_b64, ct_b64);
            assert!(matches!(
                decode(&text),
                Err(CryptoError::InvalidIvLength { expected: 12, got }) if got == len
            ));
        }
    }

    #[test]
    fn empty_ciphertext_field_decodes() {
        let iv_b64 = Base64::encode_string(&sample_iv());
        let text = format!("NebulaEncrypt:<{}:>", iv_b64);
        let payload = decode(&text).unwrap();
        assert!(payload.ciphertext.is_empty());
    }
}
