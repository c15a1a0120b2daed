//! Little-endian field access shared by the packet codecs.

use core::fmt;

/// Errors that can occur while decoding or encoding a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Packet is shorter than the fixed layout requires
    Truncated { expected: usize, actual: usize },
    /// Output buffer too small for encoding
    BufferTooSmall,
    /// Offset is not a multiple of the chunk size
    MisalignedOffset(u16),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Truncated { expected, actual } => {
                write!(f, "packet truncated: {} bytes, need {}", actual, expected)
            }
            WireError::BufferTooSmall => f.write_str("output buffer too small"),
            WireError::MisalignedOffset(offset) => {
                write!(f, "offset {} is not chunk aligned", offset)
            }
        }
    }
}

/// Fail with [`WireError::Truncated`] unless `data` holds `expected` bytes
pub(crate) fn require_len(data: &[u8], expected: usize) -> Result<(), WireError> {
    if data.len() < expected {
        return Err(WireError::Truncated {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

pub(crate) fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

pub(crate) fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

pub(crate) fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_fields() {
        let mut buf = [0u8; 6];
        write_u32(&mut buf, 0, 0x1234_5678);
        write_u16(&mut buf, 4, 0xABCD);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12, 0xCD, 0xAB]);
        assert_eq!(read_u32(&buf, 0), 0x1234_5678);
        assert_eq!(read_u16(&buf, 4), 0xABCD);
    }

    #[test]
    fn test_require_len() {
        assert!(require_len(&[0u8; 4], 4).is_ok());
        assert_eq!(
            require_len(&[0u8; 3], 4),
            Err(WireError::Truncated {
                expected: 4,
                actual: 3
            })
        );
    }
}
