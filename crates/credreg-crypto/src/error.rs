//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from key handling and content encryption.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key material has the wrong length or encoding.
    #[error("invalid symmetric key: {0}")]
    InvalidKey(String),

    /// The envelope text is not a well-formed envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// AES-GCM encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// AES-GCM decryption or tag verification failed.
    #[error("decryption failed: wrong key or tampered ciphertext")]
    Decryption,

    /// Decrypted bytes are not valid UTF-8 text.
    #[error("decrypted content is not valid UTF-8")]
    NotUtf8,
}
