//! Inkcast Over-the-Air Protocol
//!
//! This crate defines the packet format exchanged between the gateway and
//! the e-ink tags over the A7106 radio. Every packet is a fixed 40 byte
//! radio payload, all integers little-endian.
//!
//! # Protocol Overview
//!
//! A tag wakes up and sends a HELLO to the gateway address:
//! ```text
//! ┌──────────┬───────────┬──────────┬─────────────┬──────────┬──────────┬────────────────┐
//! │ TAG TYPE │ CLIENT ID │ GIT HASH │ INSTALL DATE│ RESERVED │ IMAGE ID │ MISSING BITMAP │
//! │ 4B       │ 4B        │ 4B       │ 4B          │ 4B       │ 4B       │ 16B            │
//! └──────────┴───────────┴──────────┴─────────────┴──────────┴──────────┴────────────────┘
//! ```
//!
//! The gateway answers on the tag's own address with exactly one chunk:
//! ```text
//! ┌──────────┬────────┬───────┬──────────────┐
//! │ IMAGE ID │ OFFSET │ FLAGS │ PAYLOAD      │
//! │ 4B       │ 2B     │ 2B    │ 32B          │
//! └──────────┴────────┴───────┴──────────────┘
//! ```
//!
//! The image is 128×250 pixels at one bit per pixel (4000 bytes), cut into
//! 125 chunks of 32 bytes. Bit `i` of the missing bitmap stands for the chunk
//! at byte offset `32 * i`; a set bit means the tag still needs that chunk.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bitmap;
pub mod hello;
pub mod reply;
pub mod wire;

pub use bitmap::MissingBitmap;
pub use hello::HelloMessage;
pub use reply::{DataReply, ReplyFlags};
pub use wire::WireError;

/// Display width in pixels (122 visible, padded to a byte boundary)
pub const IMAGE_WIDTH: usize = 128;

/// Display height in pixels
pub const IMAGE_HEIGHT: usize = 250;

/// Packed image size in bytes (1 bit per pixel)
pub const IMAGE_SIZE: usize = IMAGE_WIDTH * IMAGE_HEIGHT / 8;

/// Bytes carried by one data reply
pub const CHUNK_SIZE: usize = 32;

/// Number of chunks the image is cut into
pub const CHUNK_COUNT: usize = IMAGE_SIZE / CHUNK_SIZE;

/// Number of bitmap flags a tag may report
pub const BITMAP_FLAGS: usize = 126;

/// Size of the on-air bitmap field in bytes
pub const BITMAP_SIZE: usize = 16;

/// Size of a HELLO packet
pub const HELLO_SIZE: usize = 24 + BITMAP_SIZE;

/// Size of a data reply packet
pub const REPLY_SIZE: usize = 8 + CHUNK_SIZE;

/// Radio packet length used by both directions
pub const PACKET_SIZE: usize = if HELLO_SIZE > REPLY_SIZE {
    HELLO_SIZE
} else {
    REPLY_SIZE
};
