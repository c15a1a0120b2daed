//! Data reply sent by the gateway in answer to a HELLO

use heapless::Vec;

use crate::wire::{read_u16, read_u32, require_len, write_u16, write_u32, WireError};
use crate::{CHUNK_SIZE, REPLY_SIZE};

/// Field offsets inside the reply packet
mod field {
    pub const IMAGE_ID: usize = 0;
    pub const OFFSET: usize = 4;
    pub const FLAGS: usize = 6;
    pub const PAYLOAD: usize = 8;
}

/// Reply flag word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReplyFlags(pub u16);

impl ReplyFlags {
    /// No flags set, transfer still in progress
    pub const NONE: ReplyFlags = ReplyFlags(0);
    /// Tag holds the whole image and may go back to sleep
    pub const COMPLETE: ReplyFlags = ReplyFlags(1 << 0);

    /// Check whether the complete bit is set
    pub const fn is_complete(self) -> bool {
        self.0 & Self::COMPLETE.0 != 0
    }
}

/// One image chunk addressed to a single tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataReply {
    /// Identifier of the image the chunk belongs to
    pub image_id: u32,
    /// Byte offset of the chunk inside the image
    pub offset: u16,
    /// Reply flags
    pub flags: ReplyFlags,
    /// Chunk data
    pub payload: [u8; CHUNK_SIZE],
}

impl DataReply {
    /// Cut the chunk at `offset` out of `image`
    ///
    /// Bytes past the end of the image are zero filled, so an offset at or
    /// beyond the image length yields an all-zero payload.
    pub fn from_image(
        image_id: u32,
        image: &[u8],
        offset: u16,
        flags: ReplyFlags,
    ) -> Result<Self, WireError> {
        if offset as usize % CHUNK_SIZE != 0 {
            return Err(WireError::MisalignedOffset(offset));
        }

        let mut payload = [0u8; CHUNK_SIZE];
        let start = (offset as usize).min(image.len());
        let end = (start + CHUNK_SIZE).min(image.len());
        payload[..end - start].copy_from_slice(&image[start..end]);

        Ok(Self {
            image_id,
            offset,
            flags,
            payload,
        })
    }

    /// Encode this reply into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, WireError> {
        if buffer.len() < REPLY_SIZE {
            return Err(WireError::BufferTooSmall);
        }

        write_u32(buffer, field::IMAGE_ID, self.image_id);
        write_u16(buffer, field::OFFSET, self.offset);
        write_u16(buffer, field::FLAGS, self.flags.0);
        buffer[field::PAYLOAD..field::PAYLOAD + CHUNK_SIZE].copy_from_slice(&self.payload);

        Ok(REPLY_SIZE)
    }

    /// Encode this reply into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, REPLY_SIZE>, WireError> {
        let mut buffer = [0u8; REPLY_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| WireError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Decode a reply (tag side, simulators and tests)
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        require_len(data, REPLY_SIZE)?;

        let mut payload = [0u8; CHUNK_SIZE];
        payload.copy_from_slice(&data[field::PAYLOAD..field::PAYLOAD + CHUNK_SIZE]);

        Ok(Self {
            image_id: read_u32(data, field::IMAGE_ID),
            offset: read_u16(data, field::OFFSET),
            flags: ReplyFlags(read_u16(data, field::FLAGS)),
            payload,
        })
    }
}
