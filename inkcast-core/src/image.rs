//! Served image and its content identifier
//!
//! An [`ImageState`] is immutable once built. The image feed publishes a
//! fresh `Arc<ImageState>` whenever the source changes, and the server takes
//! one snapshot per served hello, so a reply never mixes two images.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use inkcast_protocol::{DataReply, ReplyFlags, WireError, IMAGE_SIZE};
use sha2::{Digest, Sha256};

/// Errors that can occur when building an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Buffer is not exactly one packed frame
    WrongSize { expected: usize, actual: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::WrongSize { expected, actual } => {
                write!(f, "image is {} bytes, expected {}", actual, expected)
            }
        }
    }
}

/// Content identifier of an image: the first four SHA-256 bytes, big-endian
pub fn image_id(bytes: &[u8]) -> u32 {
    let digest = Sha256::digest(bytes);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Packed 1 bpp frame together with its identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageState {
    bytes: Vec<u8>,
    id: u32,
}

impl ImageState {
    /// Build an image from a packed frame, computing its id
    pub fn new(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.len() != IMAGE_SIZE {
            return Err(ImageError::WrongSize {
                expected: IMAGE_SIZE,
                actual: bytes.len(),
            });
        }
        let id = image_id(&bytes);
        Ok(Self { bytes, id })
    }

    /// All-white frame, served until the first real image is loaded
    pub fn blank() -> Self {
        let bytes = alloc::vec![0u8; IMAGE_SIZE];
        let id = image_id(&bytes);
        Self { bytes, id }
    }

    /// Image identifier
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Packed frame bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Build the reply carrying the chunk at `offset`
    pub fn reply(&self, offset: u16, flags: ReplyFlags) -> Result<DataReply, WireError> {
        DataReply::from_image(self.id, &self.bytes, offset, flags)
    }
}

/// Source of the image currently being served
pub trait ImageSource {
    /// Take a consistent snapshot of the current image
    fn snapshot(&self) -> Arc<ImageState>;
}

impl ImageSource for Arc<ImageState> {
    fn snapshot(&self) -> Arc<ImageState> {
        Arc::clone(self)
    }
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn snapshot(&self) -> Arc<ImageState> {
        (**self).snapshot()
    }
}
