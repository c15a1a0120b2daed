//! Packet radio trait

use core::fmt;

/// Largest packet any supported transceiver can carry
pub const MAX_PACKET_LEN: usize = 64;

/// Received packet buffer
pub type Packet = heapless::Vec<u8, MAX_PACKET_LEN>;

/// Trait for half-duplex packet transceivers
///
/// The radio filters on a single address at a time. Receiving and
/// transmitting both block until the chip reports the packet done.
pub trait PacketRadio {
    /// Error type for radio operations
    type Error: fmt::Debug + fmt::Display;

    /// Switch the address the radio listens on and transmits to
    ///
    /// Must be called before every receive and before every transmit.
    fn set_address(&mut self, address: u32) -> Result<(), Self::Error>;

    /// Block until one packet arrives on the current address
    fn receive(&mut self) -> Result<Packet, Self::Error>;

    /// Send one packet to the current address and wait until it is out
    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error>;
}

impl<R: PacketRadio + ?Sized> PacketRadio for &mut R {
    type Error = R::Error;

    fn set_address(&mut self, address: u32) -> Result<(), Self::Error> {
        (**self).set_address(address)
    }

    fn receive(&mut self) -> Result<Packet, Self::Error> {
        (**self).receive()
    }

    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        (**self).transmit(payload)
    }
}
