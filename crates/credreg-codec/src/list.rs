//! # Status List
//!
//! A fixed-capacity, bit-addressable list of status codes. Index `i` owns
//! bits `[i * status_size, (i + 1) * status_size)`, most significant bit
//! first, and index 0 is the left-most bit of the first byte. Trailing
//! padding bits in the last byte are always zero.

use bitvec::order::Msb0;
use bitvec::vec::BitVec;
use credreg_core::{MAX_LIST_SIZE, MAX_STATUS_SIZE};

use crate::error::CodecError;

/// Decoded status list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    size: u64,
    status_size: u8,
    bits: BitVec<u8, Msb0>,
}

impl StatusList {
    /// Create an all-zero ("valid") list.
    pub fn new(size: u64, status_size: u8) -> Result<Self, CodecError> {
        let bytes = byte_len(size, status_size)?;
        Ok(Self {
            size,
            status_size,
            bits: BitVec::from_vec(vec![0u8; bytes]),
        })
    }

    /// Rebuild a list from its packed bytes.
    pub fn from_bytes(bytes: Vec<u8>, size: u64, status_size: u8) -> Result<Self, CodecError> {
        let expected = byte_len(size, status_size)?;
        if bytes.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            size,
            status_size,
            bits: BitVec::from_vec(bytes),
        })
    }

    /// Number of addressable indices.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bits per index.
    pub fn status_size(&self) -> u8 {
        self.status_size
    }

    /// The packed bytes, MSB-first.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }

    /// Read the code stored at `index`.
    pub fn code_at(&self, index: u64) -> Result<u32, CodecError> {
        let start = self.offset(index)?;
        let width = usize::from(self.status_size);
        Ok(self.bits[start..start + width]
            .iter()
            .fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit)))
    }

    /// Store `code` at `index`, returning the previous code.
    pub fn set_code(&mut self, index: u64, code: u32) -> Result<u32, CodecError> {
        if u64::from(code) >= 1u64 << self.status_size {
            return Err(CodecError::CodeOutOfRange {
                code,
                status_size: self.status_size,
            });
        }
        let previous = self.code_at(index)?;
        let start = self.offset(index)?;
        let width = usize::from(self.status_size);
        for i in 0..width {
            let bit = (code >> (width - 1 - i)) & 1 == 1;
            self.bits.set(start + i, bit);
        }
        Ok(previous)
    }

    /// Iterate over `(index, code)` for every index holding a non-zero code.
    pub fn set_entries(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        (0..self.size).filter_map(move |index| match self.code_at(index) {
            Ok(0) | Err(_) => None,
            Ok(code) => Some((index, code)),
        })
    }

    fn offset(&self, index: u64) -> Result<usize, CodecError> {
        if index >= self.size {
            return Err(CodecError::InvalidIndex {
                index,
                size: self.size,
            });
        }
        // Bounded by MAX_LIST_SIZE * MAX_STATUS_SIZE, which fits in usize.
        Ok((index * u64::from(self.status_size)) as usize)
    }
}

/// Number of packed bytes for a list of the given dimensions.
pub fn byte_len(size: u64, status_size: u8) -> Result<usize, CodecError> {
    if size == 0 || size > MAX_LIST_SIZE || status_size == 0 || status_size > MAX_STATUS_SIZE {
        return Err(CodecError::InvalidDimensions { size, status_size });
    }
    let bits = size * u64::from(status_size);
    Ok(bits.div_ceil(8) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_is_all_zero() {
        let list = StatusList::new(131_072, 1).unwrap();
        assert_eq!(list.as_bytes().len(), 16_384);
        assert_eq!(list.code_at(0).unwrap(), 0);
        assert_eq!(list.code_at(131_071).unwrap(), 0);
        assert_eq!(list.set_entries().count(), 0);
    }

    #[test]
    fn index_zero_is_leftmost_bit() {
        let mut list = StatusList::new(16, 1).unwrap();
        list.set_code(0, 1).unwrap();
        assert_eq!(list.as_bytes(), &[0b1000_0000, 0]);
        list.set_code(15, 1).unwrap();
        assert_eq!(list.as_bytes(), &[0b1000_0000, 0b0000_0001]);
    }

    #[test]
    fn multi_bit_codes_pack_msb_first() {
        let mut list = StatusList::new(4, 2).unwrap();
        list.set_code(0, 0b10).unwrap();
        list.set_code(3, 0b01).unwrap();
        assert_eq!(list.as_bytes(), &[0b1000_0001]);
        assert_eq!(list.code_at(0).unwrap(), 2);
        assert_eq!(list.code_at(3).unwrap(), 1);
    }

    #[test]
    fn set_code_returns_previous() {
        let mut list = StatusList::new(8, 2).unwrap();
        assert_eq!(list.set_code(5, 3).unwrap(), 0);
        assert_eq!(list.set_code(5, 1).unwrap(), 3);
        assert_eq!(list.code_at(5).unwrap(), 1);
    }

    #[test]
    fn out_of_range_index_rejected() {
        let list = StatusList::new(10, 1).unwrap();
        assert!(matches!(
            list.code_at(10),
            Err(CodecError::InvalidIndex { index: 10, size: 10 })
        ));
    }

    #[test]
    fn code_wider_than_status_size_rejected() {
        let mut list = StatusList::new(10, 2).unwrap();
        assert!(matches!(
            list.set_code(0, 4),
            Err(CodecError::CodeOutOfRange { code: 4, status_size: 2 })
        ));
    }

    #[test]
    fn dimensions_validated() {
        assert!(StatusList::new(0, 1).is_err());
        assert!(StatusList::new(10, 0).is_err());
        assert!(StatusList::new(10, 9).is_err());
        assert!(StatusList::new(MAX_LIST_SIZE + 1, 1).is_err());
    }

    #[test]
    fn set_entries_lists_non_zero_codes() {
        let mut list = StatusList::new(100, 3).unwrap();
        list.set_code(7, 5).unwrap();
        list.set_code(42, 1).unwrap();
        let entries: Vec<_> = list.set_entries().collect();
        assert_eq!(entries, vec![(7, 5), (42, 1)]);
    }

    #[test]
    fn from_bytes_checks_length() {
        assert!(matches!(
            StatusList::from_bytes(vec![0; 3], 16, 1),
            Err(CodecError::LengthMismatch { expected: 2, actual: 3 })
        ));
    }
}
