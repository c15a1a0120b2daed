//! Radio bring-up on the gateway host

use inkcast_core::ident::DEFAULT_THRESHOLD;
use inkcast_core::CorrelationSummary;
use inkcast_drivers::radio::{CalibrationReport, A7106};
use inkcast_hal_linux::{open_radio_lines, LinuxBus, PinMap};
use linux_embedded_hal::{CdevPin, Delay};

use crate::config::RadioSection;
use crate::error::Result;

/// A7106 on Linux GPIO lines
pub type GatewayRadio = A7106<LinuxBus, CdevPin, Delay>;

/// Open the GPIO lines and initialize the radio listening on `address`
///
/// Fails if the chip does not answer, which is the only fatal radio error.
pub fn open(config: &RadioSection, address: u32) -> Result<(GatewayRadio, CalibrationReport)> {
    let pins = PinMap::from(config.pins);
    let lines = open_radio_lines(&config.gpio_chip, &pins, config.timing())?;

    let mut radio = A7106::new(
        lines.bus,
        lines.ready,
        lines.delay,
        config.driver_config(address),
    );
    let report = radio.initialize()?;
    Ok((radio, report))
}

/// Warn about an address that tags may fail to sync on
pub fn check_address(address: u32) {
    let summary = CorrelationSummary::of(address, DEFAULT_THRESHOLD);
    if !summary.is_acceptable() {
        log::warn!(
            "address {:08x} has high autocorrelation ({} shifts above {}, {} at it)",
            address,
            summary.fails,
            DEFAULT_THRESHOLD,
            summary.near_fails
        );
    }
}
