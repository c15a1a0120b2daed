//! GPIO allocation and radio line setup
//!
//! Tracks which line offsets are in use to prevent conflicts, then requests
//! the five radio lines from the GPIO character device.

use std::collections::BTreeSet;

use inkcast_hal::{BitBangBus, BusTiming};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};

use crate::LinuxHalError;

/// Consumer label shown by `gpioinfo`
const CONSUMER: &str = "inkcast";

/// Radio bus built from character device lines
pub type LinuxBus = BitBangBus<CdevPin, CdevPin, CdevPin, CdevPin, Delay>;

/// Line offsets of the radio signals on one GPIO chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// Chip select (SCS)
    pub cs: u32,
    /// Serial clock (SCK)
    pub ck: u32,
    /// Data towards the radio (SDIO)
    pub da: u32,
    /// Data from the radio (GIO1, configured as 4-wire SPI output)
    pub io1: u32,
    /// Ready/busy indication (GIO2, configured as WTR)
    pub io2: u32,
}

impl Default for PinMap {
    /// Wiring of the original Raspberry Pi gateway (BCM numbering)
    fn default() -> Self {
        Self {
            cs: 2,
            ck: 3,
            da: 4,
            io1: 17,
            io2: 27,
        }
    }
}

/// GPIO allocator to track line usage
#[derive(Debug, Default)]
pub struct GpioAllocator {
    allocated: BTreeSet<u32>,
}

impl GpioAllocator {
    /// Create a new GPIO allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a line offset
    pub fn allocate(&mut self, line: u32) -> Result<(), LinuxHalError> {
        if !self.allocated.insert(line) {
            return Err(LinuxHalError::PinConflict(line));
        }
        Ok(())
    }

    /// Check if a line is allocated
    pub fn is_allocated(&self, line: u32) -> bool {
        self.allocated.contains(&line)
    }

    /// Get the number of allocated lines
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

impl PinMap {
    /// Check that no line offset is used twice
    pub fn validate(&self) -> Result<(), LinuxHalError> {
        let mut allocator = GpioAllocator::new();
        for line in [self.cs, self.ck, self.da, self.io1, self.io2] {
            allocator.allocate(line)?;
        }
        Ok(())
    }
}

/// Everything the radio driver needs from the host
pub struct RadioLines {
    /// Register bus over CS/CK/DA/IO1
    pub bus: LinuxBus,
    /// Ready/busy line (IO2)
    pub ready: CdevPin,
    /// Delay provider for calibration and polling
    pub delay: Delay,
}

fn request(
    chip: &mut Chip,
    line: u32,
    flags: LineRequestFlags,
    default: u8,
    name: &str,
) -> Result<CdevPin, LinuxHalError> {
    let gpio = |source| LinuxHalError::Gpio {
        context: format!("{} (line {})", name, line),
        source,
    };

    let handle = chip
        .get_line(line)
        .map_err(gpio)?
        .request(flags, default, CONSUMER)
        .map_err(gpio)?;
    CdevPin::new(handle).map_err(gpio)
}

/// Request the radio lines from `chip_path` and build the register bus
pub fn open_radio_lines(
    chip_path: &str,
    pins: &PinMap,
    timing: BusTiming,
) -> Result<RadioLines, LinuxHalError> {
    pins.validate()?;

    let mut chip = Chip::new(chip_path).map_err(|source| LinuxHalError::Gpio {
        context: format!("opening {}", chip_path),
        source,
    })?;

    log::debug!(
        "Requesting radio lines on {}: cs={} ck={} da={} io1={} io2={}",
        chip_path,
        pins.cs,
        pins.ck,
        pins.da,
        pins.io1,
        pins.io2
    );

    let cs = request(&mut chip, pins.cs, LineRequestFlags::OUTPUT, 1, "cs")?;
    let ck = request(&mut chip, pins.ck, LineRequestFlags::OUTPUT, 0, "ck")?;
    let da = request(&mut chip, pins.da, LineRequestFlags::OUTPUT, 0, "da")?;
    let io1 = request(&mut chip, pins.io1, LineRequestFlags::INPUT, 0, "io1")?;
    let io2 = request(&mut chip, pins.io2, LineRequestFlags::INPUT, 0, "io2")?;

    let bus = BitBangBus::new(cs, ck, da, io1, Delay, timing).map_err(LinuxHalError::Bus)?;

    Ok(RadioLines {
        bus,
        ready: io2,
        delay: Delay,
    })
}
