//! # credreg-crypto — Content Encryption and Checksums
//!
//! - [`SymmetricKey`]: 256-bit key, zeroized on drop, constant-time
//!   comparison, redacted `Debug`.
//! - [`envelope`]: AES-256-GCM encryption of encoded status list content.
//!   The envelope is text so it can be stored and published exactly like
//!   plaintext content.
//! - [`Checksum`]: SHA-256 of published content, reported by the ledger.

pub mod digest;
pub mod envelope;
pub mod error;
pub mod key;

pub use digest::Checksum;
pub use envelope::{open, open_str, seal, seal_str};
pub use error::CryptoError;
pub use key::SymmetricKey;
