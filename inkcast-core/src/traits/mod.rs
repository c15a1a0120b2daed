//! Hardware abstraction traits
//!
//! These traits define the interface between the distribution logic
//! and hardware-specific implementations.

pub mod radio;

pub use radio::{Packet, PacketRadio, MAX_PACKET_LEN};
