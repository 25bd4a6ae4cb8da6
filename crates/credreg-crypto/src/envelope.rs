// AES-256-GCM content envelope.
//
// Wire form: multibase `u` + unpadded base64url(nonce ‖ ciphertext ‖ tag).
// A fresh 96-bit nonce is drawn for every encryption.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand_core::{OsRng, RngCore};

use crate::error::CryptoError;
use crate::key::SymmetricKey;

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const PREFIX: char = 'u';

/// Encrypt `plaintext` into envelope text.
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("cipher init failed: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut packed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    packed.extend_from_slice(&nonce_bytes);
    packed.extend_from_slice(&ciphertext);

    let mut out = String::with_capacity(1 + packed.len() * 4 / 3 + 4);
    out.push(PREFIX);
    out.push_str(&Base64UrlUnpadded::encode_string(&packed));
    Ok(out)
}

/// Decrypt envelope text produced by [`seal`].
pub fn open(key: &SymmetricKey, envelope: &str) -> Result<Vec<u8>, CryptoError> {
    let body = envelope
        .strip_prefix(PREFIX)
        .ok_or_else(|| CryptoError::MalformedEnvelope("missing multibase prefix".into()))?;
    let packed = Base64UrlUnpadded::decode_vec(body)
        .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;
    if packed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::MalformedEnvelope(format!(
            "envelope is {} bytes, shorter than nonce and tag",
            packed.len()
        )));
    }
    let (nonce, ciphertext) = packed.split_at(NONCE_SIZE);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

/// Encrypt UTF-8 text.
pub fn seal_str(key: &SymmetricKey, plaintext: &str) -> Result<String, CryptoError> {
    seal(key, plaintext.as_bytes())
}

/// Decrypt to UTF-8 text.
pub fn open_str(key: &SymmetricKey, envelope: &str) -> Result<String, CryptoError> {
    String::from_utf8(open(key, envelope)?).map_err(|_| CryptoError::NotUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SymmetricKey {
        SymmetricKey::from_bytes([0x42; 32])
    }

    #[test]
    fn seal_open_round_trip() {
        let key = test_key();
        let text = seal_str(&key, "uH4sIAAAAAAAA_-3BMQEAAADCoPVPbQwfoAAAAAAAAAAAAAAAAAAAAIC3AYbSVKsAQAAA").unwrap();
        assert!(text.starts_with('u'));
        assert_eq!(
            open_str(&key, &text).unwrap(),
            "uH4sIAAAAAAAA_-3BMQEAAADCoPVPbQwfoAAAAAAAAAAAAAAAAAAAAIC3AYbSVKsAQAAA"
        );
    }

    #[test]
    fn nonces_differ_per_encryption() {
        let key = test_key();
        let a = seal(&key, b"same").unwrap();
        let b = seal(&key, b"same").unwrap();
        assert_ne!(a, b);
        assert_eq!(open(&key, &a).unwrap(), b"same");
        assert_eq!(open(&key, &b).unwrap(), b"same");
    }

    #[test]
    fn wrong_key_fails() {
        let text = seal(&test_key(), b"secret").unwrap();
        let other = SymmetricKey::from_bytes([0x43; 32]);
        assert!(matches!(open(&other, &text), Err(CryptoError::Decryption)));
    }

    #[test]
    fn tampered_envelope_fails() {
        let key = test_key();
        let text = seal(&key, b"integrity").unwrap();
        let mut packed = Base64UrlUnpadded::decode_vec(&text[1..]).unwrap();
        let last = packed.len() - 1;
        packed[last] ^= 0x01;
        let tampered = format!("u{}", Base64UrlUnpadded::encode_string(&packed));
        assert!(matches!(open(&key, &tampered), Err(CryptoError::Decryption)));
    }

    #[test]
    fn malformed_envelopes_rejected() {
        let key = test_key();
        assert!(matches!(
            open(&key, "no-prefix"),
            Err(CryptoError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            open(&key, "uAAAA"),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }
}
