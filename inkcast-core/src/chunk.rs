//! Chunk selection
//!
//! A tag reporting another image restarts from offset zero. Otherwise the
//! lowest missing chunk is sent; with nothing missing the tag gets the first
//! chunk again together with the complete flag so it can sleep.

use inkcast_protocol::{HelloMessage, ReplyFlags, CHUNK_SIZE};

/// Why a reply carries the chunk it does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyKind {
    /// Tag holds a different image, restart from the beginning
    StaleImage,
    /// Lowest missing chunk
    Chunk { index: usize },
    /// Nothing missing, tag may sleep
    Complete,
}

/// Offset and flags for the next reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkSelection {
    /// Byte offset of the chunk to send
    pub offset: u16,
    /// Reply flags
    pub flags: ReplyFlags,
    /// Reason for the choice
    pub kind: ReplyKind,
}

/// Pick the chunk to answer `hello` with while serving `current_image_id`
pub fn select_chunk(hello: &HelloMessage, current_image_id: u32) -> ChunkSelection {
    if hello.image_id != current_image_id {
        return ChunkSelection {
            offset: 0,
            flags: ReplyFlags::NONE,
            kind: ReplyKind::StaleImage,
        };
    }

    match hello.missing.first_missing() {
        Some(index) => ChunkSelection {
            offset: (index * CHUNK_SIZE) as u16,
            flags: ReplyFlags::NONE,
            kind: ReplyKind::Chunk { index },
        },
        None => ChunkSelection {
            offset: 0,
            flags: ReplyFlags::COMPLETE,
            kind: ReplyKind::Complete,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkcast_protocol::{MissingBitmap, BITMAP_FLAGS, BITMAP_SIZE, IMAGE_SIZE};
    use proptest::prelude::*;

    const IMAGE_ID: u32 = 0xFC19_B199;

    fn hello(image_id: u32, missing: MissingBitmap) -> HelloMessage {
        HelloMessage {
            tag_type: 0,
            client_id: 0x930B_51DE,
            git_hash: 0,
            install_date: 0,
            reserved: 0,
            image_id,
            missing,
        }
    }

    #[test]
    fn test_single_missing_chunk() {
        let mut missing = MissingBitmap::empty();
        missing.set_missing(5);
        let selection = select_chunk(&hello(IMAGE_ID, missing), IMAGE_ID);

        assert_eq!(selection.offset, 160);
        assert_eq!(selection.flags, ReplyFlags::NONE);
        assert_eq!(selection.kind, ReplyKind::Chunk { index: 5 });
    }

    #[test]
    fn test_lowest_bit_wins() {
        let mut missing = MissingBitmap::empty();
        missing.set_missing(90);
        missing.set_missing(12);
        missing.set_missing(40);
        let selection = select_chunk(&hello(IMAGE_ID, missing), IMAGE_ID);
        assert_eq!(selection.offset, 12 * 32);
    }

    #[test]
    fn test_complete() {
        let selection = select_chunk(&hello(IMAGE_ID, MissingBitmap::empty()), IMAGE_ID);
        assert_eq!(selection.offset, 0);
        assert!(selection.flags.is_complete());
        assert_eq!(selection.kind, ReplyKind::Complete);
    }

    #[test]
    fn test_last_meaningful_flag_points_past_image() {
        let mut missing = MissingBitmap::empty();
        missing.set_missing(BITMAP_FLAGS - 1);
        let selection = select_chunk(&hello(IMAGE_ID, missing), IMAGE_ID);
        assert_eq!(selection.offset as usize, IMAGE_SIZE);
    }

    #[test]
    fn test_unused_top_bits_ignored() {
        let mut bytes = [0u8; BITMAP_SIZE];
        bytes[15] = 0xC0;
        let selection = select_chunk(&hello(IMAGE_ID, MissingBitmap::from_bytes(bytes)), IMAGE_ID);
        assert_eq!(selection.kind, ReplyKind::Complete);
    }

    proptest! {
        #[test]
        fn prop_stale_image_restarts(bytes in any::<[u8; BITMAP_SIZE]>(), reported in any::<u32>()) {
            prop_assume!(reported != IMAGE_ID);
            let selection = select_chunk(&hello(reported, MissingBitmap::from_bytes(bytes)), IMAGE_ID);
            prop_assert_eq!(selection.offset, 0);
            prop_assert!(!selection.flags.is_complete());
            prop_assert_eq!(selection.kind, ReplyKind::StaleImage);
        }

        #[test]
        fn prop_offset_is_lowest_missing(bytes in any::<[u8; BITMAP_SIZE]>()) {
            let missing = MissingBitmap::from_bytes(bytes);
            let selection = select_chunk(&hello(IMAGE_ID, missing), IMAGE_ID);
            match (0..BITMAP_FLAGS).find(|&i| bytes[i / 8] & (1 << (i % 8)) != 0) {
                Some(k) => {
                    prop_assert_eq!(selection.offset as usize, 32 * k);
                    prop_assert!(!selection.flags.is_complete());
                }
                None => {
                    prop_assert_eq!(selection.offset, 0);
                    prop_assert!(selection.flags.is_complete());
                }
            }
        }
    }
}
