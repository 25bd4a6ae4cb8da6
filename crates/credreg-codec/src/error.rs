//! # Codec Error Types

use thiserror::Error;

/// Errors from building, mutating, encoding or decoding a status list.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The requested index is outside the list.
    #[error("index {index} is out of range for a list of size {size}")]
    InvalidIndex {
        /// The rejected index.
        index: u64,
        /// Number of addressable indices in the list.
        size: u64,
    },

    /// The code does not fit in the list's bits per index.
    #[error("status code {code} does not fit in {status_size} bit(s)")]
    CodeOutOfRange {
        /// The rejected code.
        code: u32,
        /// Bits per index of the list.
        status_size: u8,
    },

    /// The list dimensions are not representable.
    #[error("invalid list dimensions: size {size}, status size {status_size}")]
    InvalidDimensions {
        /// Requested number of indices.
        size: u64,
        /// Requested bits per index.
        status_size: u8,
    },

    /// The status size does not agree with the list type.
    #[error("status size {status_size} is not valid for a {list_type} list")]
    ListTypeMismatch {
        /// Requested bits per index.
        status_size: u8,
        /// The list type name.
        list_type: &'static str,
    },

    /// The text is not valid unpadded base64url.
    #[error("encoded list is not valid base64url: {0}")]
    Base64(String),

    /// GZIP compression or decompression failed.
    #[error("encoded list is not valid gzip: {0}")]
    Compression(#[from] std::io::Error),

    /// The decompressed bitstring does not match the expected dimensions.
    #[error("decoded list is {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Bytes required by `size * status_size`.
        expected: usize,
        /// Bytes actually decompressed (capped at `expected + 1`).
        actual: usize,
    },
}

impl From<base64ct::Error> for CodecError {
    fn from(err: base64ct::Error) -> Self {
        Self::Base64(err.to_string())
    }
}
