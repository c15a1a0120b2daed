//! Software serial bus over four GPIO lines
//!
//! # Framing
//!
//! Every transaction is framed the same way:
//! - chip select pulled low
//! - each outgoing bit, MSB first: clock low, set data-out, clock high
//! - clock low
//! - each incoming bit, MSB first: clock high, sample data-in, clock low
//! - chip select released high
//!
//! The chip latches data-out on the rising edge and presents data-in while
//! the clock is high, so sampling happens between the two edges.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::bus::{BusError, BusTiming, Line, RegisterBus};

/// Bit-banged register bus
pub struct BitBangBus<CS, CK, DO, DI, D> {
    cs: CS,
    ck: CK,
    data_out: DO,
    data_in: DI,
    delay: D,
    timing: BusTiming,
}

impl<CS, CK, DO, DI, D> BitBangBus<CS, CK, DO, DI, D>
where
    CS: OutputPin,
    CK: OutputPin,
    DO: OutputPin,
    DI: InputPin,
    D: DelayNs,
{
    /// Create a new bus and drive the lines to their idle levels
    ///
    /// Idle is chip select high, clock low, data-out low.
    pub fn new(
        cs: CS,
        ck: CK,
        data_out: DO,
        data_in: DI,
        delay: D,
        timing: BusTiming,
    ) -> Result<Self, BusError> {
        let mut bus = Self {
            cs,
            ck,
            data_out,
            data_in,
            delay,
            timing,
        };
        bus.cs.set_high().map_err(|_| BusError::Pin(Line::ChipSelect))?;
        bus.ck.set_low().map_err(|_| BusError::Pin(Line::Clock))?;
        bus.data_out
            .set_low()
            .map_err(|_| BusError::Pin(Line::DataOut))?;
        Ok(bus)
    }

    /// Get the bus timing
    pub fn timing(&self) -> BusTiming {
        self.timing
    }

    /// Release the pins
    pub fn release(self) -> (CS, CK, DO, DI, D) {
        (self.cs, self.ck, self.data_out, self.data_in, self.delay)
    }

    fn settle(&mut self) {
        if self.timing.half_period_ns > 0 {
            self.delay.delay_ns(self.timing.half_period_ns);
        }
    }

    fn clock(&mut self, high: bool) -> Result<(), BusError> {
        let result = if high {
            self.ck.set_high()
        } else {
            self.ck.set_low()
        };
        result.map_err(|_| BusError::Pin(Line::Clock))?;
        self.settle();
        Ok(())
    }

    fn shift_out(&mut self, byte: u8) -> Result<(), BusError> {
        for bit in (0..8).rev() {
            self.clock(false)?;
            let result = if byte & (1 << bit) != 0 {
                self.data_out.set_high()
            } else {
                self.data_out.set_low()
            };
            result.map_err(|_| BusError::Pin(Line::DataOut))?;
            self.clock(true)?;
        }
        Ok(())
    }

    fn shift_in(&mut self) -> Result<u8, BusError> {
        let mut byte = 0u8;
        for _ in 0..8 {
            self.clock(true)?;
            byte <<= 1;
            if self
                .data_in
                .is_high()
                .map_err(|_| BusError::Pin(Line::DataIn))?
            {
                byte |= 1;
            }
            self.clock(false)?;
        }
        Ok(byte)
    }

    fn framed(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), BusError> {
        self.cs.set_low().map_err(|_| BusError::Pin(Line::ChipSelect))?;
        self.settle();

        for &byte in write {
            self.shift_out(byte)?;
        }
        self.clock(false)?;

        for slot in read.iter_mut() {
            *slot = self.shift_in()?;
        }
        Ok(())
    }
}

impl<CS, CK, DO, DI, D> RegisterBus for BitBangBus<CS, CK, DO, DI, D>
where
    CS: OutputPin,
    CK: OutputPin,
    DO: OutputPin,
    DI: InputPin,
    D: DelayNs,
{
    type Error = BusError;

    fn transaction(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), BusError> {
        let result = self.framed(write, read);

        // Always release chip select, even after a failed transfer
        let released = self
            .cs
            .set_high()
            .map_err(|_| BusError::Pin(Line::ChipSelect));
        self.settle();

        result.and(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    /// Recorded line activity
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Cs(bool),
        Ck(bool),
        Do(bool),
        Sample,
    }

    #[derive(Default)]
    struct Wire {
        events: Vec<Event>,
        /// Bits presented on data-in, consumed per sample
        miso: VecDeque<bool>,
    }

    type SharedWire = Rc<RefCell<Wire>>;

    struct MockOut {
        wire: SharedWire,
        kind: fn(bool) -> Event,
    }

    impl ErrorType for MockOut {
        type Error = Infallible;
    }

    impl OutputPin for MockOut {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.wire.borrow_mut().events.push((self.kind)(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.wire.borrow_mut().events.push((self.kind)(true));
            Ok(())
        }
    }

    struct MockIn {
        wire: SharedWire,
    }

    impl ErrorType for MockIn {
        type Error = Infallible;
    }

    impl InputPin for MockIn {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let mut wire = self.wire.borrow_mut();
            wire.events.push(Event::Sample);
            Ok(wire.miso.pop_front().unwrap_or(false))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn mock_bus() -> (
        BitBangBus<MockOut, MockOut, MockOut, MockIn, NoDelay>,
        SharedWire,
    ) {
        let wire: SharedWire = Rc::new(RefCell::new(Wire::default()));
        let bus = BitBangBus::new(
            MockOut {
                wire: wire.clone(),
                kind: Event::Cs,
            },
            MockOut {
                wire: wire.clone(),
                kind: Event::Ck,
            },
            MockOut {
                wire: wire.clone(),
                kind: Event::Do,
            },
            MockIn { wire: wire.clone() },
            NoDelay,
            BusTiming::default(),
        )
        .unwrap();
        wire.borrow_mut().events.clear();
        (bus, wire)
    }

    /// Data-out level at every rising clock edge
    fn latched_bits(events: &[Event]) -> Vec<bool> {
        let mut level = false;
        let mut bits = Vec::new();
        for event in events {
            match *event {
                Event::Do(value) => level = value,
                Event::Ck(true) => bits.push(level),
                _ => {}
            }
        }
        bits
    }

    #[test]
    fn test_idle_levels_on_new() {
        let wire: SharedWire = Rc::new(RefCell::new(Wire::default()));
        let _bus = BitBangBus::new(
            MockOut {
                wire: wire.clone(),
                kind: Event::Cs,
            },
            MockOut {
                wire: wire.clone(),
                kind: Event::Ck,
            },
            MockOut {
                wire: wire.clone(),
                kind: Event::Do,
            },
            MockIn { wire: wire.clone() },
            NoDelay,
            BusTiming::default(),
        )
        .unwrap();

        let events = wire.borrow().events.clone();
        assert_eq!(events, [Event::Cs(true), Event::Ck(false), Event::Do(false)]);
    }

    #[test]
    fn test_write_is_msb_first() {
        let (mut bus, wire) = mock_bus();
        bus.write(&[0xA5]).unwrap();

        let events = wire.borrow().events.clone();
        assert_eq!(events.first(), Some(&Event::Cs(false)));
        assert_eq!(events.last(), Some(&Event::Cs(true)));
        assert_eq!(
            latched_bits(&events),
            [true, false, true, false, false, true, false, true]
        );
    }

    #[test]
    fn test_clock_low_before_each_data_change() {
        let (mut bus, wire) = mock_bus();
        bus.write(&[0x81]).unwrap();

        let events = wire.borrow().events.clone();
        // Every data-out change is preceded by a falling clock edge
        for (i, event) in events.iter().enumerate() {
            if matches!(event, Event::Do(_)) {
                assert_eq!(events[i - 1], Event::Ck(false));
                assert_eq!(events[i + 1], Event::Ck(true));
            }
        }
        // The clock is parked low before chip select is released
        let n = events.len();
        assert_eq!(events[n - 2], Event::Ck(false));
    }

    #[test]
    fn test_read_samples_while_clock_high() {
        let (mut bus, wire) = mock_bus();
        {
            let mut w = wire.borrow_mut();
            // 0x3C, MSB first
            w.miso
                .extend([false, false, true, true, true, true, false, false]);
        }

        let mut read = [0u8; 1];
        bus.transaction(&[0x40], &mut read).unwrap();
        assert_eq!(read[0], 0x3C);

        let events = wire.borrow().events.clone();
        for (i, event) in events.iter().enumerate() {
            if *event == Event::Sample {
                assert_eq!(events[i - 1], Event::Ck(true));
                assert_eq!(events[i + 1], Event::Ck(false));
            }
        }
        // Eight bits written, eight sampled
        assert_eq!(
            events.iter().filter(|e| **e == Event::Sample).count(),
            8
        );
    }

    #[test]
    fn test_multi_byte_read() {
        let (mut bus, wire) = mock_bus();
        {
            let mut w = wire.borrow_mut();
            for byte in [0x93u8, 0x0B] {
                for bit in (0..8).rev() {
                    w.miso.push_back(byte & (1 << bit) != 0);
                }
            }
        }

        let mut read = [0u8; 2];
        bus.transaction(&[0x46], &mut read).unwrap();
        assert_eq!(read, [0x93, 0x0B]);
    }

    #[test]
    fn test_single_frame_per_transaction() {
        let (mut bus, wire) = mock_bus();
        bus.write(&[0x06, 0x55, 0xAB, 0xCD, 0xEF]).unwrap();

        let events = wire.borrow().events.clone();
        let selects = events.iter().filter(|e| **e == Event::Cs(false)).count();
        assert_eq!(selects, 1);
        assert_eq!(latched_bits(&events).len(), 40);
    }
}
