//! Gateway configuration
//!
//! Loaded from a TOML file. Every key has a default matching the reference
//! wiring on a Raspberry Pi, so an empty file (or a missing section) is a
//! valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use inkcast_drivers::radio::RadioConfig;
use inkcast_hal::BusTiming;
use inkcast_hal_linux::PinMap;
use inkcast_protocol::PACKET_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub radio: RadioSection,
    pub image: ImageSection,
    pub logging: LoggingSection,
}

/// Radio and GPIO settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RadioSection {
    /// RF channel (frequency = 2400.001 + 0.5 * channel MHz)
    pub channel: u8,
    /// Address tags send their hellos to
    pub gateway_id: u32,
    /// Fixed radio packet length in bytes
    pub packet_length: u8,
    /// GPIO character device the radio is wired to
    pub gpio_chip: String,
    /// Extra delay per bus clock edge in nanoseconds
    pub bus_half_period_ns: u32,
    /// Delay between ready line polls in microseconds
    pub ready_poll_us: u32,
    /// Line offsets
    pub pins: PinSection,
}

impl Default for RadioSection {
    fn default() -> Self {
        let radio = RadioConfig::default();
        Self {
            channel: radio.channel,
            gateway_id: radio.device_id,
            packet_length: radio.packet_length,
            gpio_chip: "/dev/gpiochip0".to_string(),
            bus_half_period_ns: 0,
            ready_poll_us: radio.ready_poll_us,
            pins: PinSection::default(),
        }
    }
}

impl RadioSection {
    /// Driver configuration listening on `address`
    pub fn driver_config(&self, address: u32) -> RadioConfig {
        RadioConfig {
            channel: self.channel,
            device_id: address,
            packet_length: self.packet_length,
            ready_poll_us: self.ready_poll_us,
        }
    }

    /// Bit-bang timing
    pub fn timing(&self) -> BusTiming {
        BusTiming {
            half_period_ns: self.bus_half_period_ns,
        }
    }
}

/// GPIO line offsets (BCM numbering on a Raspberry Pi)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PinSection {
    pub cs: u32,
    pub ck: u32,
    pub da: u32,
    pub io1: u32,
    pub io2: u32,
}

impl Default for PinSection {
    fn default() -> Self {
        let pins = PinMap::default();
        Self {
            cs: pins.cs,
            ck: pins.ck,
            da: pins.da,
            io1: pins.io1,
            io2: pins.io2,
        }
    }
}

impl From<PinSection> for PinMap {
    fn from(pins: PinSection) -> Self {
        PinMap {
            cs: pins.cs,
            ck: pins.ck,
            da: pins.da,
            io1: pins.io1,
            io2: pins.io2,
        }
    }
}

/// Served image source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageSection {
    /// Packed 1 bpp image file (4000 bytes)
    pub path: PathBuf,
    /// How often the file's modification time is checked
    pub poll_interval_ms: u64,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hello.raw"),
            poll_interval_ms: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default log filter (trace, debug, info, warn, error), `RUST_LOG` wins
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: GatewayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let length = self.radio.packet_length as usize;
        if !(PACKET_SIZE..=64).contains(&length) {
            return Err(GatewayError::InvalidConfig(format!(
                "radio.packet_length must be between {} and 64, got {}",
                PACKET_SIZE, length
            )));
        }
        if self.image.poll_interval_ms == 0 {
            return Err(GatewayError::InvalidConfig(
                "image.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        PinMap::from(self.radio.pins).validate()?;
        Ok(())
    }
}
