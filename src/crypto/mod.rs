//! Confidentiality primitives: password hashing, reversible field encryption
//! for PII, authenticated transport encryption, and one-way token hashing.
//!
//! Key handling policy: both symmetric keys are 32 bytes supplied as 64
//! hexadecimal characters. A bad key is a startup error, never a per-request
//! one. Decryption failures are surfaced as [`CryptoError`] so callers can
//! keep them apart from "not found" and from credential rejection.

pub mod field;
pub mod password;
pub mod token;
pub mod transport;

pub use self::field::FieldCipher;
pub use self::token::hash_token;
pub use self::transport::{TransportCipher, TransportPayload};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    Key(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,

    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    #[error("password hashing failed")]
    Hash,
}

/// Decode a 64-hex-character string into a 256-bit key.
pub(crate) fn decode_key_hex(key_hex: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = hex::decode(key_hex.trim())
        .map_err(|_| CryptoError::Key("key must be hexadecimal".to_string()))?;
    let key: [u8; 32] = bytes.try_into().map_err(|_| {
        CryptoError::Key("key must be 64 hexadecimal characters (32 bytes)".to_string())
    })?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_key_hex_accepts_64_hex_chars() {
        let key = decode_key_hex(&"ab".repeat(32)).unwrap();
        assert_eq!(key, [0xab; 32]);
    }

    #[test]
    fn decode_key_hex_trims_whitespace() {
        let padded = format!(" {}\n", "00".repeat(32));
        assert!(decode_key_hex(&padded).is_ok());
    }

    #[test]
    fn decode_key_hex_rejects_bad_input() {
        assert!(decode_key_hex("not hex").is_err());
        assert!(decode_key_hex(&"ab".repeat(16)).is_err());
        assert!(decode_key_hex(&"ab".repeat(33)).is_err());
    }
}
