//! Authenticated encryption for request/response payload transport.
//!
//! The envelope carries hex-encoded `iv`, `authTag`, and `ciphertext`
//! fields. AES-256-GCM, 96-bit random nonce per call, 256-bit key. Decrypt
//! fails closed on a missing field, bad hex, tag mismatch, or key mismatch.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{decode_key_hex, CryptoError};

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// Wire form of an encrypted payload. Field names match what clients send.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransportPayload {
    pub iv: String,
    pub auth_tag: String,
    pub ciphertext: String,
}

impl TransportPayload {
    /// Cheap structural check so the handler layer can tell an envelope from
    /// a plain JSON body without attempting a decrypt.
    #[must_use]
    pub fn looks_like(value: &Value) -> bool {
        value.get("iv").map_or(false, Value::is_string)
            && value.get("authTag").map_or(false, Value::is_string)
            && value.get("ciphertext").map_or(false, Value::is_string)
    }
}

pub struct TransportCipher {
    key: [u8; 32],
}

impl TransportCipher {
    pub fn new(key_hex: &SecretString) -> Result<Self, CryptoError> {
        Ok(Self {
            key: decode_key_hex(key_hex.expose_secret())?,
        })
    }

    pub fn encrypt(&self, plain: &str) -> Result<TransportPayload, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::Encrypt)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // aes-gcm appends the tag to the ciphertext; the wire format carries
        // the tag in its own field.
        let mut sealed = cipher
            .encrypt(nonce, plain.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;
        let tag = sealed.split_off(sealed.len() - TAG_SIZE);

        Ok(TransportPayload {
            iv: hex::encode(nonce_bytes),
            auth_tag: hex::encode(tag),
            ciphertext: hex::encode(sealed),
        })
    }

    pub fn decrypt(&self, payload: &TransportPayload) -> Result<String, CryptoError> {
        let iv = decode_hex_field(&payload.iv, "iv")?;
        let tag = decode_hex_field(&payload.auth_tag, "authTag")?;
        let ciphertext = decode_hex_field(&payload.ciphertext, "ciphertext")?;

        if iv.len() != NONCE_SIZE {
            return Err(CryptoError::Malformed("iv must be 12 bytes".to_string()));
        }
        if tag.len() != TAG_SIZE {
            return Err(CryptoError::Malformed("authTag must be 16 bytes".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::Decrypt)?;
        let nonce = Nonce::from_slice(&iv);

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plain = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &sealed,
                    aad: &[],
                },
            )
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plain)
            .map_err(|_| CryptoError::Malformed("decrypted payload is not UTF-8".to_string()))
    }
}

/// Parse decrypted transport text: structured JSON when it parses, the raw
/// string otherwise, and an empty object for blank input. Lets the transport
/// layer carry either structured or opaque payloads transparently.
#[must_use]
pub fn parse_decrypted(plain: &str) -> Value {
    let trimmed = plain.trim();
    if trimmed.is_empty() {
        return Value::Object(serde_json::Map::new());
    }

    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(plain.to_string()))
}

fn decode_hex_field(field: &str, name: &str) -> Result<Vec<u8>, CryptoError> {
    if field.is_empty() {
        return Err(CryptoError::Malformed(format!("missing {name}")));
    }

    hex::decode(field).map_err(|_| CryptoError::Malformed(format!("{name} is not hex")))
}
