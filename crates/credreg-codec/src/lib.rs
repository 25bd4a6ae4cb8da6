//! # credreg-codec — Status List Encoding
//!
//! Encodes and decodes the fixed-capacity, bit-addressable status lists
//! published for verifiable credentials.
//!
//! - **Single-bit** lists store one bit per credential for one boolean
//!   purpose (revocation or suspension).
//! - **Multi-bit** lists store `status_size` bits per credential, holding an
//!   enumerable status code whose meaning comes from the registry's declared
//!   status messages.
//!
//! Both share one wire format: entries packed most-significant-bit first,
//! GZIP-compressed, unpadded base64url with the multibase prefix `u`.
//!
//! ```
//! use credreg_codec::{decode, encode, StatusList};
//! use credreg_core::ListType;
//!
//! let mut list = StatusList::new(131_072, 1).unwrap();
//! list.set_code(10, 1).unwrap();
//! let text = encode(&list, ListType::SingleBit).unwrap();
//! let back = decode(&text, ListType::SingleBit, 131_072, 1).unwrap();
//! assert_eq!(back.code_at(10).unwrap(), 1);
//! ```

pub mod bitstring;
pub mod error;
pub mod list;

pub use bitstring::{blank, code_at, decode, encode, message_for, MULTIBASE_PREFIX};
pub use error::CodecError;
pub use list::StatusList;
