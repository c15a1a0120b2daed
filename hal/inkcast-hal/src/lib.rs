//! Inkcast Hardware Abstraction Layer
//!
//! This crate turns four plain digital lines into the serial register bus
//! spoken by the A7106 transceiver. The lines are any `embedded-hal` 1.0
//! digital pins, so the same bus runs on Linux GPIO character devices or on
//! a microcontroller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Chip drivers (inkcast-drivers)         │
//! └─────────────────────────────────────────┘
//!                     │  RegisterBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  inkcast-hal (this crate - BitBangBus)  │
//! └─────────────────────────────────────────┘
//!                     │  embedded-hal digital pins
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ inkcast-hal-  │       │  MCU HAL pins │
//! │    linux      │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::RegisterBus`] - Framed write-then-read transactions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bitbang;
pub mod bus;

// Re-export key types at crate root for convenience
pub use bitbang::BitBangBus;
pub use bus::{BusError, BusTiming, Line, RegisterBus};
