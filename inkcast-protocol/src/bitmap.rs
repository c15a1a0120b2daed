//! Missing-chunk bitmap reported by tags
//!
//! Bit `i` lives in byte `i / 8` at bit position `i % 8` (LSB first), so the
//! 16 byte field reads as a little-endian 128 bit integer. Only the first
//! [`BITMAP_FLAGS`] bits carry meaning; the top two are ignored.

use crate::{BITMAP_FLAGS, BITMAP_SIZE, CHUNK_SIZE};

/// Set of chunk indices a tag has not received yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MissingBitmap([u8; BITMAP_SIZE]);

impl MissingBitmap {
    /// Bitmap with no chunk missing (transfer complete)
    pub const fn empty() -> Self {
        Self([0; BITMAP_SIZE])
    }

    /// Bitmap with the first `count` chunks missing (a freshly reset tag)
    pub fn first_n(count: usize) -> Self {
        let mut bitmap = Self::empty();
        for index in 0..count.min(BITMAP_FLAGS) {
            bitmap.set_missing(index);
        }
        bitmap
    }

    /// Wrap the raw on-air bytes
    pub const fn from_bytes(bytes: [u8; BITMAP_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw on-air bytes
    pub const fn as_bytes(&self) -> &[u8; BITMAP_SIZE] {
        &self.0
    }

    /// Check whether chunk `index` is flagged as missing
    ///
    /// Indices past the meaningful range always read as present.
    pub fn is_missing(&self, index: usize) -> bool {
        if index >= BITMAP_FLAGS {
            return false;
        }
        self.0[index / 8] & (1 << (index % 8)) != 0
    }

    /// Flag chunk `index` as missing. Out-of-range indices are ignored.
    pub fn set_missing(&mut self, index: usize) {
        if index < BITMAP_FLAGS {
            self.0[index / 8] |= 1 << (index % 8);
        }
    }

    /// Flag chunk `index` as received. Out-of-range indices are ignored.
    pub fn set_received(&mut self, index: usize) {
        if index < BITMAP_FLAGS {
            self.0[index / 8] &= !(1 << (index % 8));
        }
    }

    /// Lowest missing chunk index, scanning upward from zero
    pub fn first_missing(&self) -> Option<usize> {
        (0..BITMAP_FLAGS).find(|&index| self.is_missing(index))
    }

    /// Byte offset of the lowest missing chunk
    pub fn first_missing_offset(&self) -> Option<usize> {
        self.first_missing().map(|index| index * CHUNK_SIZE)
    }

    /// Number of chunks still missing
    pub fn missing_count(&self) -> usize {
        (0..BITMAP_FLAGS).filter(|&index| self.is_missing(index)).count()
    }

    /// True when nothing is missing
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }
}
