//! Amiccom A7106 2.4 GHz FSK transceiver
//!
//! The A7106 is configured through a 3-wire register interface. With GIO1
//! mapped as SPI data-out the bus becomes 4-wire, which is what
//! [`inkcast_hal::BitBangBus`] speaks. GIO2 is mapped to WTR
//! (wait-until-TX/RX-finished) and serves as the ready/busy line.
//!
//! # Register Protocol
//!
//! - Write: address byte (bit 6 clear), then data bytes
//! - Read: address byte with bit 6 set, then data bytes clocked in
//! - Strobe: 4-bit command in the upper nibble of a single byte
//!
//! Multi-byte registers (FIFO data, ID data) auto-increment through their
//! internal buffer within one chip-select frame.
//!
//! # Features Used
//!
//! - FIFO simple mode with a fixed packet length
//! - 4 byte ID, 4 byte preamble, CRC and FEC enabled
//! - 500 kbps data rate from a 16 MHz crystal

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use inkcast_core::traits::{Packet, PacketRadio, MAX_PACKET_LEN};
use inkcast_hal::RegisterBus;

/// A7106 register addresses
pub mod reg {
    /// Mode status / software reset on write
    pub const MODE: u8 = 0x00;
    /// Mode control
    pub const MODE_CONTROL: u8 = 0x01;
    /// Calibration control
    pub const CALIBRATION: u8 = 0x02;
    /// FIFO end pointer (packet length - 1)
    pub const FIFO_I: u8 = 0x03;
    /// FIFO pointer margin / mode
    pub const FIFO_II: u8 = 0x04;
    /// FIFO data port
    pub const FIFO_DATA: u8 = 0x05;
    /// ID data port (4 bytes)
    pub const ID_DATA: u8 = 0x06;
    /// RF channel number (PLL I)
    pub const CHANNEL: u8 = 0x0F;
    /// IF filter calibration result
    pub const IF_CALIB_I: u8 = 0x22;
    /// VCO current calibration
    pub const VCO_CURRENT_CALIB: u8 = 0x24;
    /// VCO single band calibration
    pub const VCO_BAND_CALIB_I: u8 = 0x25;
    /// Last documented register
    pub const LAST: u8 = 0x32;

    /// Read flag in the address byte
    pub const READ: u8 = 1 << 6;

    /// Data sheet names, indexed by address
    const NAMES: [&str; LAST as usize + 1] = [
        "MODE",
        "MODE_CONTROL",
        "CALIBRATION",
        "FIFO_I",
        "FIFO_II",
        "FIFO_DATA",
        "ID_DATA",
        "RC_OSC_I",
        "RC_OSC_II",
        "RC_OSC_III",
        "CKO_PIN",
        "GIO1_PIN_I",
        "GIO2_PIN_II",
        "CLOCK",
        "DATA_RATE",
        "PLL_I",
        "PLL_II",
        "PLL_III",
        "PLL_IV",
        "PLL_V",
        "TX_I",
        "TX_II",
        "DELAY_I",
        "DELAY_II",
        "RX",
        "RX_GAIN_I",
        "RX_GAIN_II",
        "RX_GAIN_III",
        "RX_GAIN_IV",
        "RSSI_THRESHOLD",
        "ADC",
        "CODE_I",
        "CODE_II",
        "CODE_III",
        "IF_CALIB_I",
        "IF_CALIB_II",
        "VCO_CURRENT_CALIB",
        "VCO_BAND_CALIB_I",
        "VCO_BAND_CALIB_II",
        "BATTERY_DETECT",
        "TX_TEST",
        "RX_DEM_TEST_I",
        "RX_DEM_TEST_II",
        "CHARGE_PUMP",
        "CRYSTAL_TEST",
        "PLL_TEST",
        "VCO_TEST_I",
        "VCO_TEST_II",
        "IFAT",
        "RSCALE",
        "FILTER_TEST",
    ];

    /// Data sheet name of a register
    pub fn name(address: u8) -> &'static str {
        NAMES.get(address as usize).copied().unwrap_or("RESERVED")
    }
}

/// MODE register: CRC check failed on the last packet
const MODE_CRC_ERROR: u8 = 1 << 5;
/// MODE register: FEC check failed on the last packet
const MODE_FEC_ERROR: u8 = 1 << 6;

/// CALIBRATION register: IF filter, VCO current, VCO band and RSSI
/// calibration enable bits, cleared by the chip when done
const CALIBRATION_ENABLE: u8 = 0x0F;
/// IF_CALIB_I: IF filter auto calibration failed
const IF_FILTER_FAILED: u8 = 1 << 4;
/// VCO_CURRENT_CALIB: VCO current calibration failed
const VCO_CURRENT_FAILED: u8 = 1 << 4;
/// VCO_BAND_CALIB_I: VCO bank calibration failed
const VCO_BANK_FAILED: u8 = 1 << 3;

/// Time the chip needs to finish auto calibration
const CALIBRATION_WAIT_MS: u32 = 500;

/// Register programming applied at start-up, in order
///
/// Values follow the data sheet recommendations for a 16 MHz crystal and
/// 500 kbps, with GIO1 as SPI data-out, GIO2 as WTR, FEC and CRC on.
pub const INIT_SEQUENCE: [(u8, u8); 47] = [
    (0x00, 0x00), // Software reset
    (0x01, 0x62), // Auto RSSI, auto IF offset off, AIF inverted
    (0x02, 0x00), // Calibration set later
    (0x03, 0x3F), // FIFO end pointer, 64 bytes
    (0x04, 0x00), // FIFO simple mode
    (0x07, 0x00),
    (0x08, 0x00), // Wake on radio off
    (0x09, 0x00), // Wake on radio off
    (0x0A, 0x00), // CKO pin off
    (0x0B, 0x19), // GIO1: 4-wire SPI data-out
    (0x0C, 0x01), // GIO2: WTR
    (0x0D, 0x05), // 16 MHz crystal, 500 kbps
    (0x0E, 0x00), // 16 MHz crystal, 500 kbps
    (0x0F, 0x00), // Channel, set later
    (0x10, 0x9E), // 16 MHz crystal, 500 kbps
    (0x11, 0x4B),
    (0x12, 0x00), // 16 MHz crystal, 500 kbps
    (0x13, 0x02), // 16 MHz crystal, 500 kbps
    (0x14, 0x16), // TX moving average and modulation filter off
    (0x15, 0x2B),
    (0x16, 0x12),
    (0x17, 0x4F), // XTAL 600 us, AGC 20 us, RSSI 80 us
    (0x18, 0x63), // BWS = 1
    (0x19, 0x80), // Mixer and LNA gain 24 dB
    (0x1A, 0x80),
    (0x1B, 0x00),
    (0x1C, 0x0A),
    (0x1D, 0x32),
    (0x1E, 0xC3), // RSSI ADC on
    (0x1F, 0x1F), // No whitening, FEC, CRC, 4 byte ID, 4 byte preamble
    (0x20, 0x16), // PMD for 250/500 kbps
    (0x21, 0x00), // Whitening seed off
    (0x22, 0x00),
    (0x24, 0x13),
    (0x26, 0x23),
    (0x27, 0x00),
    (0x28, 0x37), // TX power: TBG=7 PAC=3, about 1.35 dBm
    (0x29, 0x47), // DCM for 250/500 kbps
    (0x2A, 0x80),
    (0x2B, 0xD6),
    (0x2C, 0x01),
    (0x2D, 0x51),
    (0x2E, 0x18),
    (0x2F, 0x00),
    (0x30, 0x01),
    (0x31, 0x0F),
    (0x32, 0x7F), // Maximum PA ramping
];

/// Strobe commands (upper nibble of the command byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Strobe {
    /// Sleep mode
    Sleep = 0x8,
    /// Idle mode
    Idle = 0x9,
    /// Standby mode
    Standby = 0xA,
    /// PLL mode
    Pll = 0xB,
    /// Receive
    Rx = 0xC,
    /// Transmit
    Tx = 0xD,
    /// Reset the FIFO write pointer
    TxFifoReset = 0xE,
    /// Reset the FIFO read pointer
    RxFifoReset = 0xF,
}

impl Strobe {
    /// Bus byte for this command
    pub const fn byte(self) -> u8 {
        (self as u8) << 4
    }

    /// Decode a strobe byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte >> 4 {
            0x8 => Some(Strobe::Sleep),
            0x9 => Some(Strobe::Idle),
            0xA => Some(Strobe::Standby),
            0xB => Some(Strobe::Pll),
            0xC => Some(Strobe::Rx),
            0xD => Some(Strobe::Tx),
            0xE => Some(Strobe::TxFifoReset),
            0xF => Some(Strobe::RxFifoReset),
            _ => None,
        }
    }
}

/// A7106 driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// RF channel, frequency = 2400.001 + 0.5 * channel MHz
    pub channel: u8,
    /// 32-bit address the radio filters on
    pub device_id: u32,
    /// Fixed packet length in bytes (1-64)
    pub packet_length: u8,
    /// Delay between ready line polls in µs, 0 to spin
    pub ready_poll_us: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: 4,
            device_id: 0x55AB_CDEF,
            packet_length: 40,
            ready_poll_us: 50,
        }
    }
}

/// Transceiver state as tracked by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransceiverState {
    /// Registers not programmed yet
    Uninitialized,
    /// Auto calibration running
    Calibrating,
    /// Ready for a transfer
    Idle,
    /// Packet going out
    Transmitting,
    /// Waiting for a packet
    Receiving,
    /// Sleep or standby strobe issued
    LowPower,
}

/// Raw calibration status read back after auto calibration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    /// CALIBRATION register
    pub control: u8,
    /// IF_CALIB_I register
    pub if_filter: u8,
    /// VCO_CURRENT_CALIB register
    pub vco_current: u8,
    /// VCO_BAND_CALIB_I register
    pub vco_bank: u8,
}

impl CalibrationReport {
    /// Some calibration did not finish in time
    pub fn unfinished(&self) -> bool {
        self.control & CALIBRATION_ENABLE != 0
    }

    /// IF filter calibration failed
    pub fn if_filter_failed(&self) -> bool {
        self.if_filter & IF_FILTER_FAILED != 0
    }

    /// VCO current calibration failed
    pub fn vco_current_failed(&self) -> bool {
        self.vco_current & VCO_CURRENT_FAILED != 0
    }

    /// VCO bank calibration failed
    pub fn vco_bank_failed(&self) -> bool {
        self.vco_bank & VCO_BANK_FAILED != 0
    }

    /// All calibrations finished and passed
    pub fn is_ok(&self) -> bool {
        !(self.unfinished()
            || self.if_filter_failed()
            || self.vco_current_failed()
            || self.vco_bank_failed())
    }

    fn log_warnings(&self) {
        if self.unfinished() {
            log::warn!(
                "calibration did not finish, CALIBRATION=0b{:08b} expected 0bxxxx0000",
                self.control
            );
        }
        if self.if_filter_failed() {
            log::warn!(
                "IF filter calibration failed, IF_CALIB_I=0b{:08b}",
                self.if_filter
            );
        }
        if self.vco_current_failed() {
            log::warn!(
                "VCO current calibration failed, VCO_CURRENT_CALIB=0b{:08b}",
                self.vco_current
            );
        }
        if self.vco_bank_failed() {
            log::warn!(
                "VCO bank calibration failed, VCO_BAND_CALIB_I=0b{:08b}",
                self.vco_bank
            );
        }
    }
}

/// Configuration errors, fatal to the operation that raised them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// ID register read back differently than written
    IdMismatch { written: u32, read: u32 },
    /// Packet length outside 1..=64
    PacketLengthOutOfRange(u8),
    /// Payload longer than the configured packet length
    PayloadTooLong { len: usize, max: usize },
}

/// Receive errors; the packet is discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// CRC check failed
    Crc,
    /// FEC check failed
    Fec,
}

/// A7106 driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum A7106Error<E> {
    /// Register bus failure
    Bus(E),
    /// Reading the ready line failed
    ReadyPin,
    /// Invalid configuration
    Config(ConfigError),
    /// Corrupt packet received
    Rx(RxError),
}

impl<E: fmt::Display> fmt::Display for A7106Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            A7106Error::Bus(e) => write!(f, "bus error: {}", e),
            A7106Error::ReadyPin => f.write_str("failed to read the ready line"),
            A7106Error::Config(ConfigError::IdMismatch { written, read }) => write!(
                f,
                "failed to set id, read 0x{:08x} expected 0x{:08x}",
                read, written
            ),
            A7106Error::Config(ConfigError::PacketLengthOutOfRange(n)) => {
                write!(f, "packet length out of range, got {} min 1 max 64", n)
            }
            A7106Error::Config(ConfigError::PayloadTooLong { len, max }) => {
                write!(f, "packet data too long, length {} maximum {}", len, max)
            }
            A7106Error::Rx(RxError::Crc) => f.write_str("CRC error on receive"),
            A7106Error::Rx(RxError::Fec) => f.write_str("FEC error on receive"),
        }
    }
}

/// Number of documented registers
pub const REGISTER_COUNT: usize = reg::LAST as usize + 1;

/// A7106 driver
///
/// Owns the register bus, the WTR ready line and a delay source.
pub struct A7106<B, W, D> {
    bus: B,
    ready: W,
    delay: D,
    config: RadioConfig,
    state: TransceiverState,
}

impl<B, W, D> A7106<B, W, D>
where
    B: RegisterBus,
    W: InputPin,
    D: DelayNs,
{
    /// Create a driver; nothing is sent until [`Self::initialize`]
    pub fn new(bus: B, ready: W, delay: D, config: RadioConfig) -> Self {
        Self {
            bus,
            ready,
            delay,
            config,
            state: TransceiverState::Uninitialized,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// Current transceiver state
    pub fn state(&self) -> TransceiverState {
        self.state
    }

    /// Release the bus, ready line and delay
    pub fn release(self) -> (B, W, D) {
        (self.bus, self.ready, self.delay)
    }

    /// Program every register, calibrate, then apply the configuration
    ///
    /// Calibration failures are logged and reported but do not fail
    /// initialization.
    pub fn initialize(&mut self) -> Result<CalibrationReport, A7106Error<B::Error>> {
        for &(address, value) in INIT_SEQUENCE.iter() {
            self.write_register(address, value)?;
        }

        self.state = TransceiverState::Calibrating;
        let report = self.calibrate()?;
        self.state = TransceiverState::Idle;

        self.set_channel(self.config.channel)?;
        self.set_device_id(self.config.device_id)?;
        self.set_packet_length(self.config.packet_length)?;

        log::info!(
            "A7106 ready: channel {}, id {:08x}, packet length {}",
            self.config.channel,
            self.config.device_id,
            self.config.packet_length
        );
        Ok(report)
    }

    /// Run IF filter and VCO auto calibration and check the results
    pub fn calibrate(&mut self) -> Result<CalibrationReport, A7106Error<B::Error>> {
        // Clear the manual override values so the chip calibrates itself
        self.write_register(reg::IF_CALIB_I, 0)?;
        self.write_register(reg::VCO_CURRENT_CALIB, 0)?;
        self.write_register(reg::VCO_BAND_CALIB_I, 0)?;

        self.strobe(Strobe::Pll)?;
        self.write_register(reg::CALIBRATION, CALIBRATION_ENABLE)?;
        self.delay.delay_ms(CALIBRATION_WAIT_MS);

        let report = CalibrationReport {
            control: self.read_register(reg::CALIBRATION)?,
            if_filter: self.read_register(reg::IF_CALIB_I)?,
            vco_current: self.read_register(reg::VCO_CURRENT_CALIB)?,
            vco_bank: self.read_register(reg::VCO_BAND_CALIB_I)?,
        };
        report.log_warnings();
        Ok(report)
    }

    /// Read one register
    pub fn read_register(&mut self, address: u8) -> Result<u8, A7106Error<B::Error>> {
        let mut value = [0u8; 1];
        self.read_registers(address, &mut value)?;
        Ok(value[0])
    }

    /// Read `buffer.len()` bytes from a register port
    pub fn read_registers(
        &mut self,
        address: u8,
        buffer: &mut [u8],
    ) -> Result<(), A7106Error<B::Error>> {
        self.bus
            .transaction(&[address | reg::READ], buffer)
            .map_err(A7106Error::Bus)
    }

    /// Write one register
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), A7106Error<B::Error>> {
        self.write_registers(address, &[value])
    }

    /// Write several bytes to a register port in one frame
    pub fn write_registers(
        &mut self,
        address: u8,
        data: &[u8],
    ) -> Result<(), A7106Error<B::Error>> {
        let mut frame = [0u8; MAX_PACKET_LEN + 1];
        if data.len() > MAX_PACKET_LEN {
            return Err(A7106Error::Config(ConfigError::PayloadTooLong {
                len: data.len(),
                max: MAX_PACKET_LEN,
            }));
        }
        frame[0] = address & !reg::READ;
        frame[1..=data.len()].copy_from_slice(data);
        self.bus
            .write(&frame[..=data.len()])
            .map_err(A7106Error::Bus)
    }

    /// Issue a strobe command
    pub fn strobe(&mut self, command: Strobe) -> Result<(), A7106Error<B::Error>> {
        self.bus.write(&[command.byte()]).map_err(A7106Error::Bus)
    }

    /// Select the RF channel
    pub fn set_channel(&mut self, channel: u8) -> Result<(), A7106Error<B::Error>> {
        self.write_register(reg::CHANNEL, channel)?;
        self.config.channel = channel;
        Ok(())
    }

    /// Program the ID register and verify it by reading it back
    pub fn set_device_id(&mut self, id: u32) -> Result<(), A7106Error<B::Error>> {
        self.write_registers(reg::ID_DATA, &id.to_be_bytes())?;

        let mut echo = [0u8; 4];
        self.read_registers(reg::ID_DATA, &mut echo)?;
        let read = u32::from_be_bytes(echo);
        if read != id {
            return Err(A7106Error::Config(ConfigError::IdMismatch { written: id, read }));
        }

        log::trace!("id validated {:08x}", id);
        self.config.device_id = id;
        Ok(())
    }

    /// Set the fixed packet length (1-64 bytes)
    pub fn set_packet_length(&mut self, length: u8) -> Result<(), A7106Error<B::Error>> {
        if length == 0 || length as usize > MAX_PACKET_LEN {
            return Err(A7106Error::Config(ConfigError::PacketLengthOutOfRange(
                length,
            )));
        }
        self.write_register(reg::FIFO_I, length - 1)?;
        self.config.packet_length = length;
        Ok(())
    }

    /// Transmit one packet, zero padded to the packet length
    ///
    /// Blocks until WTR drops; there is no timeout.
    pub fn transmit(&mut self, payload: &[u8]) -> Result<(), A7106Error<B::Error>> {
        let length = self.config.packet_length as usize;
        if payload.len() > length {
            return Err(A7106Error::Config(ConfigError::PayloadTooLong {
                len: payload.len(),
                max: length,
            }));
        }

        let mut packet = [0u8; MAX_PACKET_LEN];
        packet[..payload.len()].copy_from_slice(payload);

        self.strobe(Strobe::TxFifoReset)?;
        self.write_registers(reg::FIFO_DATA, &packet[..length])?;
        self.strobe(Strobe::Tx)?;
        self.state = TransceiverState::Transmitting;
        let done = self.wait_ready();
        self.state = TransceiverState::Idle;
        done
    }

    /// Wait for one packet on the current ID
    ///
    /// Blocks until WTR drops; there is no timeout. Packets failing the CRC
    /// or FEC check are reported as [`A7106Error::Rx`].
    pub fn blocking_receive(&mut self) -> Result<Packet, A7106Error<B::Error>> {
        self.strobe(Strobe::Rx)?;
        self.state = TransceiverState::Receiving;
        let done = self.wait_ready();
        self.state = TransceiverState::Idle;
        done?;

        let mode = self.read_register(reg::MODE)?;
        if mode & MODE_CRC_ERROR != 0 {
            return Err(A7106Error::Rx(RxError::Crc));
        }
        if mode & MODE_FEC_ERROR != 0 {
            return Err(A7106Error::Rx(RxError::Fec));
        }

        self.strobe(Strobe::RxFifoReset)?;

        let length = self.config.packet_length as usize;
        let mut buffer = [0u8; MAX_PACKET_LEN];
        self.read_registers(reg::FIFO_DATA, &mut buffer[..length])?;

        let mut packet = Packet::new();
        // Length is at most MAX_PACKET_LEN, the capacity of Packet
        let _ = packet.extend_from_slice(&buffer[..length]);
        Ok(packet)
    }

    /// Read every documented register
    ///
    /// Reading the FIFO port advances the FIFO read pointer.
    pub fn dump_registers(&mut self) -> Result<[(u8, u8); REGISTER_COUNT], A7106Error<B::Error>> {
        let mut dump = [(0u8, 0u8); REGISTER_COUNT];
        for (address, slot) in (0u8..).zip(dump.iter_mut()) {
            *slot = (address, self.read_register(address)?);
        }
        Ok(dump)
    }

    /// Enter sleep mode
    pub fn sleep(&mut self) -> Result<(), A7106Error<B::Error>> {
        self.strobe(Strobe::Sleep)?;
        self.state = TransceiverState::LowPower;
        Ok(())
    }

    /// Enter standby mode
    pub fn standby(&mut self) -> Result<(), A7106Error<B::Error>> {
        self.strobe(Strobe::Standby)?;
        self.state = TransceiverState::LowPower;
        Ok(())
    }

    /// Return to idle from a low power mode
    pub fn idle(&mut self) -> Result<(), A7106Error<B::Error>> {
        self.strobe(Strobe::Idle)?;
        self.state = TransceiverState::Idle;
        Ok(())
    }

    fn wait_ready(&mut self) -> Result<(), A7106Error<B::Error>> {
        while self.ready.is_high().map_err(|_| A7106Error::ReadyPin)? {
            if self.config.ready_poll_us > 0 {
                self.delay.delay_us(self.config.ready_poll_us);
            }
        }
        Ok(())
    }
}

impl<B, W, D> PacketRadio for A7106<B, W, D>
where
    B: RegisterBus,
    B::Error: fmt::Debug + fmt::Display,
    W: InputPin,
    D: DelayNs,
{
    type Error = A7106Error<B::Error>;

    fn set_address(&mut self, address: u32) -> Result<(), Self::Error> {
        self.set_device_id(address)
    }

    fn receive(&mut self) -> Result<Packet, Self::Error> {
        self.blocking_receive()
    }

    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        A7106::transmit(self, payload)
    }
}
