//! # Encoded Bitstring
//!
//! Text form of a [`StatusList`]: the packed bytes are GZIP-compressed and
//! encoded as unpadded base64url with the multibase prefix `u`, following
//! [Bitstring Status List v1.0](https://www.w3.org/TR/vc-bitstring-status-list/).
//!
//! Decoding accepts the text with or without the `u` prefix. Decompression
//! stops one byte past the expected length so a hostile payload cannot
//! inflate beyond `size * status_size` bits.

use std::io::{Read, Write};

use base64ct::{Base64UrlUnpadded, Encoding};
use credreg_core::{ListKind, ListType, StatusPurpose};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::CodecError;
use crate::list::{byte_len, StatusList};

/// Multibase prefix for unpadded base64url.
pub const MULTIBASE_PREFIX: char = 'u';

/// Encode a list to its published text form.
pub fn encode(list: &StatusList, list_type: ListType) -> Result<String, CodecError> {
    check_list_type(list_type, list.status_size())?;

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(list.as_bytes())?;
    let compressed = gz.finish()?;

    let mut encoded = String::with_capacity(1 + compressed.len() * 4 / 3 + 4);
    encoded.push(MULTIBASE_PREFIX);
    encoded.push_str(&Base64UrlUnpadded::encode_string(&compressed));
    Ok(encoded)
}

/// Decode published text into a list of `size` entries of `status_size` bits.
pub fn decode(
    content: &str,
    list_type: ListType,
    size: u64,
    status_size: u8,
) -> Result<StatusList, CodecError> {
    check_list_type(list_type, status_size)?;
    let expected = byte_len(size, status_size)?;

    let text = content.strip_prefix(MULTIBASE_PREFIX).unwrap_or(content);
    let compressed = Base64UrlUnpadded::decode_vec(text)?;

    let mut raw = Vec::with_capacity(expected);
    GzDecoder::new(compressed.as_slice())
        .take(expected as u64 + 1)
        .read_to_end(&mut raw)?;
    if raw.len() != expected {
        return Err(CodecError::LengthMismatch {
            expected,
            actual: raw.len(),
        });
    }
    StatusList::from_bytes(raw, size, status_size)
}

/// Encode an all-zero list of the given dimensions.
pub fn blank(size: u64, list_type: ListType, status_size: u8) -> Result<String, CodecError> {
    encode(&StatusList::new(size, status_size)?, list_type)
}

/// Read the code at `index` directly from encoded content.
pub fn code_at(
    content: &str,
    list_type: ListType,
    size: u64,
    status_size: u8,
    index: u64,
) -> Result<u32, CodecError> {
    if index >= size {
        return Err(CodecError::InvalidIndex { index, size });
    }
    decode(content, list_type, size, status_size)?.code_at(index)
}

/// Label of `code` for a list kind.
///
/// Single-bit lists have implicit labels: 0 is `"valid"` and 1 is the past
/// participle of the list's purpose.
pub fn message_for(kind: &ListKind, code: u32) -> Option<String> {
    match kind {
        ListKind::SingleBit { purpose } => match code {
            0 => Some("valid".to_string()),
            1 => Some(
                match purpose {
                    StatusPurpose::Revocation => "revoked",
                    StatusPurpose::Suspension => "suspended",
                    StatusPurpose::Message => "set",
                }
                .to_string(),
            ),
            _ => None,
        },
        ListKind::MultiBit { messages, .. } => messages.label(code).map(str::to_string),
    }
}

fn check_list_type(list_type: ListType, status_size: u8) -> Result<(), CodecError> {
    if list_type == ListType::SingleBit && status_size != 1 {
        return Err(CodecError::ListTypeMismatch {
            status_size,
            list_type: list_type.as_str(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use credreg_core::StatusMessages;

    #[test]
    fn encoded_text_has_multibase_prefix() {
        let text = blank(131_072, ListType::SingleBit, 1).unwrap();
        assert!(text.starts_with('u'));
        assert!(!text.contains('='));
        assert!(!text.contains('+'));
        assert!(!text.contains('/'));
    }

    #[test]
    fn decode_accepts_missing_prefix() {
        let mut list = StatusList::new(64, 1).unwrap();
        list.set_code(10, 1).unwrap();
        let text = encode(&list, ListType::SingleBit).unwrap();
        let bare = &text[1..];
        let decoded = decode(bare, ListType::SingleBit, 64, 1).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn single_bit_rejects_wide_status_size() {
        let list = StatusList::new(8, 2).unwrap();
        assert!(matches!(
            encode(&list, ListType::SingleBit),
            Err(CodecError::ListTypeMismatch { .. })
        ));
    }

    #[test]
    fn decode_rejects_wrong_dimensions() {
        let text = blank(64, ListType::MultiBit, 2).unwrap();
        assert!(matches!(
            decode(&text, ListType::MultiBit, 128, 2),
            Err(CodecError::LengthMismatch { expected: 32, actual: 16 })
        ));
    }

    #[test]
    fn decode_caps_inflated_payload() {
        let text = blank(131_072, ListType::SingleBit, 1).unwrap();
        match decode(&text, ListType::SingleBit, 8, 1) {
            Err(CodecError::LengthMismatch { expected, actual }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected length mismatch, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode("u!!!", ListType::SingleBit, 8, 1),
            Err(CodecError::Base64(_))
        ));
        let not_gzip = format!("u{}", Base64UrlUnpadded::encode_string(b"plain bytes"));
        assert!(matches!(
            decode(&not_gzip, ListType::SingleBit, 8, 1),
            Err(CodecError::Compression(_))
        ));
    }

    #[test]
    fn code_at_reads_encoded_content() {
        let mut list = StatusList::new(131_072, 1).unwrap();
        list.set_code(10, 1).unwrap();
        let text = encode(&list, ListType::SingleBit).unwrap();
        assert_eq!(code_at(&text, ListType::SingleBit, 131_072, 1, 10).unwrap(), 1);
        assert_eq!(code_at(&text, ListType::SingleBit, 131_072, 1, 11).unwrap(), 0);
        assert!(matches!(
            code_at(&text, ListType::SingleBit, 131_072, 1, 131_072),
            Err(CodecError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn message_for_single_and_multi_bit() {
        let single = ListKind::single_bit(StatusPurpose::Suspension).unwrap();
        assert_eq!(message_for(&single, 0).as_deref(), Some("valid"));
        assert_eq!(message_for(&single, 1).as_deref(), Some("suspended"));
        assert_eq!(message_for(&single, 2), None);

        let messages = StatusMessages::from_pairs([
            (0, "valid"),
            (1, "revoked"),
            (2, "suspended"),
            (3, "unknown"),
        ]);
        let multi = ListKind::multi_bit(2, messages, vec![]).unwrap();
        assert_eq!(message_for(&multi, 3).as_deref(), Some("unknown"));
    }
}
