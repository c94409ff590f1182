//! Reversible encryption for stored PII fields (the phone number).
//!
//! AES-256-GCM with a random 96-bit nonce per call; the stored blob is
//! base64(nonce || ciphertext || tag), so a single column holds everything
//! needed for decryption except the process-wide key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64ct::{Base64, Encoding};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::error;

use super::{decode_key_hex, CryptoError};

const NONCE_SIZE: usize = 12;

pub struct FieldCipher {
    key: [u8; 32],
}

impl FieldCipher {
    /// Build the cipher from a 64-hex-character key string.
    pub fn new(key_hex: &SecretString) -> Result<Self, CryptoError> {
        Ok(Self {
            key: decode_key_hex(key_hex.expose_secret())?,
        })
    }

    pub fn encrypt(&self, plain: &str) -> Result<String, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::Encrypt)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher.encrypt(nonce, plain.as_bytes()).map_err(|err| {
            error!("field encryption failed: {err}");

            CryptoError::Encrypt
        })?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(Base64::encode_string(&combined))
    }

    /// Decrypt a stored blob. Any failure (bad base64, truncated blob, tag
    /// mismatch, wrong key) is a [`CryptoError`], never an empty result.
    pub fn decrypt(&self, blob: &str) -> Result<String, CryptoError> {
        let combined = Base64::decode_vec(blob.trim())
            .map_err(|_| CryptoError::Malformed("field blob is not base64".to_string()))?;

        if combined.len() < NONCE_SIZE {
            return Err(CryptoError::Malformed("field blob too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::Decrypt)?;

        let plain = cipher.decrypt(nonce, ciphertext).map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plain)
            .map_err(|_| CryptoError::Malformed("decrypted field is not UTF-8".to_string()))
    }
}
