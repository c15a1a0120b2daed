//! Linux-specific HAL for the inkcast gateway
//!
//! This crate provides Linux implementations:
//! - GPIO line allocation and conflict checks
//! - Opening the radio lines through the GPIO character device
//! - The [`inkcast_hal::BitBangBus`] instance built from those lines

pub mod gpio;

pub use gpio::{open_radio_lines, GpioAllocator, LinuxBus, PinMap, RadioLines};

/// Linux HAL errors
#[derive(Debug, thiserror::Error)]
pub enum LinuxHalError {
    /// GPIO character device error
    #[error("GPIO error on {context}: {source}")]
    Gpio {
        /// What was being done when the error occurred
        context: String,
        /// Underlying character device error
        #[source]
        source: linux_embedded_hal::gpio_cdev::errors::Error,
    },

    /// Same line offset assigned twice
    #[error("GPIO line {0} assigned to more than one signal")]
    PinConflict(u32),

    /// Driving the idle levels failed
    #[error("bus setup failed: {0}")]
    Bus(inkcast_hal::BusError),
}
