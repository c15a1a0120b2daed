//! HELLO packet sent by a tag when it wakes up

use crate::bitmap::MissingBitmap;
use crate::wire::{read_u32, require_len, write_u32, WireError};
use crate::{BITMAP_SIZE, HELLO_SIZE};

/// Field offsets inside the HELLO packet
mod field {
    pub const TAG_TYPE: usize = 0;
    pub const CLIENT_ID: usize = 4;
    pub const GIT_HASH: usize = 8;
    pub const INSTALL_DATE: usize = 12;
    pub const RESERVED: usize = 16;
    pub const IMAGE_ID: usize = 20;
    pub const BITMAP: usize = 24;
}

/// Status report from a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HelloMessage {
    /// Hardware/board type of the tag
    pub tag_type: u32,
    /// Radio address of the tag, used as the reply destination
    pub client_id: u32,
    /// Short git hash of the tag firmware
    pub git_hash: u32,
    /// When the tag was provisioned
    pub install_date: u32,
    /// Unused, carried through unchanged
    pub reserved: u32,
    /// Identifier of the image the tag is currently assembling
    pub image_id: u32,
    /// Chunks the tag still lacks
    pub missing: MissingBitmap,
}

impl HelloMessage {
    /// Decode a HELLO from a received radio payload
    ///
    /// Trailing bytes beyond [`HELLO_SIZE`] are ignored (radio padding).
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        require_len(data, HELLO_SIZE)?;

        let mut bitmap = [0u8; BITMAP_SIZE];
        bitmap.copy_from_slice(&data[field::BITMAP..field::BITMAP + BITMAP_SIZE]);

        Ok(Self {
            tag_type: read_u32(data, field::TAG_TYPE),
            client_id: read_u32(data, field::CLIENT_ID),
            git_hash: read_u32(data, field::GIT_HASH),
            install_date: read_u32(data, field::INSTALL_DATE),
            reserved: read_u32(data, field::RESERVED),
            image_id: read_u32(data, field::IMAGE_ID),
            missing: MissingBitmap::from_bytes(bitmap),
        })
    }

    /// Encode this HELLO (tag side, simulators and tests)
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, WireError> {
        if buffer.len() < HELLO_SIZE {
            return Err(WireError::BufferTooSmall);
        }

        write_u32(buffer, field::TAG_TYPE, self.tag_type);
        write_u32(buffer, field::CLIENT_ID, self.client_id);
        write_u32(buffer, field::GIT_HASH, self.git_hash);
        write_u32(buffer, field::INSTALL_DATE, self.install_date);
        write_u32(buffer, field::RESERVED, self.reserved);
        write_u32(buffer, field::IMAGE_ID, self.image_id);
        buffer[field::BITMAP..field::BITMAP + BITMAP_SIZE]
            .copy_from_slice(self.missing.as_bytes());

        Ok(HELLO_SIZE)
    }

    /// Encode into a fixed-size array
    pub fn to_bytes(&self) -> [u8; HELLO_SIZE] {
        let mut buffer = [0u8; HELLO_SIZE];
        // Cannot fail: the buffer is exactly HELLO_SIZE
        let _ = self.encode(&mut buffer);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> HelloMessage {
        let mut missing = MissingBitmap::empty();
        missing.set_missing(5);
        HelloMessage {
            tag_type: 1,
            client_id: 0x5012_3456,
            git_hash: 0x00AB_CDEF,
            install_date: 0x2024_0101,
            reserved: 0,
            image_id: 0xFC19_B199,
            missing,
        }
    }

    #[test]
    fn test_decode_field_layout() {
        let mut data = [0u8; HELLO_SIZE];
        data[4..8].copy_from_slice(&[0x56, 0x34, 0x12, 0x50]);
        data[20..24].copy_from_slice(&[0x99, 0xB1, 0x19, 0xFC]);
        data[24] = 0b0010_0000;

        let hello = HelloMessage::decode(&data).unwrap();
        assert_eq!(hello.client_id, 0x5012_3456);
        assert_eq!(hello.image_id, 0xFC19_B199);
        assert_eq!(hello.missing.first_missing(), Some(5));
    }

    #[test]
    fn test_decode_ignores_padding() {
        let mut data = [0u8; 64];
        sample().encode(&mut data).unwrap();
        data[HELLO_SIZE..].fill(0xEE);
        assert_eq!(HelloMessage::decode(&data).unwrap(), sample());
    }

    #[test]
    fn test_decode_truncated() {
        let data = [0u8; HELLO_SIZE - 1];
        assert_eq!(
            HelloMessage::decode(&data),
            Err(WireError::Truncated {
                expected: HELLO_SIZE,
                actual: HELLO_SIZE - 1
            })
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buffer = [0u8; 10];
        assert_eq!(sample().encode(&mut buffer), Err(WireError::BufferTooSmall));
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..80)) {
            let result = HelloMessage::decode(&data);
            prop_assert_eq!(result.is_ok(), data.len() >= HELLO_SIZE);
        }
    }
}
