//! Register bus abstractions
//!
//! Provides the transaction trait chip drivers talk to, independent of how
//! the bits reach the wire.

use core::fmt;

/// Framed register bus master
///
/// One transaction selects the chip, clocks out every byte of `write`,
/// clocks in `read.len()` bytes and deselects the chip again.
pub trait RegisterBus {
    /// Error type for bus operations
    type Error;

    /// Write `write`, then read into `read`, inside one chip-select frame
    fn transaction(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error>;

    /// Write data without reading
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.transaction(data, &mut [])
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    type Error = B::Error;

    fn transaction(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error> {
        (**self).transaction(write, read)
    }
}

/// Bus line identifiers, used to report which pin failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Chip select (active low)
    ChipSelect,
    /// Serial clock
    Clock,
    /// Data towards the chip
    DataOut,
    /// Data from the chip
    DataIn,
}

/// Bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Driving or sampling a line failed
    Pin(Line),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Pin(line) => write!(f, "GPIO access failed on {:?} line", line),
        }
    }
}

/// Bit-bang timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTiming {
    /// Extra delay after every clock edge in nanoseconds
    ///
    /// Zero runs the bus as fast as the GPIO backend toggles, which through
    /// the Linux character device is already well below the chip's limit.
    pub half_period_ns: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self { half_period_ns: 0 }
    }
}

impl BusTiming {
    /// Timing for a target clock frequency
    pub fn from_frequency(hz: u32) -> Self {
        let hz = hz.max(1);
        Self {
            half_period_ns: 500_000_000 / hz,
        }
    }
}
