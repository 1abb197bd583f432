//! Recording stand-ins for the bus, pins, delay and hardware description.
//!
//! Everything that touches "hardware" appends to a shared [`Journal`] so tests
//! can check the relative order of GPIO, delay and bus activity.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::{digital, spi};

use crate::display::DisplayTiming;
use crate::spi::{SpiSlave, XferFlags};
use crate::st7789v::{DeviceDescription, GpioFlags, GpioRequestError, POWER_ON_DELAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Claim,
    Release,
    Byte(u8),
    Flush,
    Cs(bool),
    Gpio(bool),
    Delay(u32),
}

pub type Journal = Rc<RefCell<Vec<Event>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Timeout,
    NoDevice,
}

pub struct MockSlave {
    journal: Journal,
    transfers: Vec<(u8, XferFlags)>,
    attempts: usize,
    fail_claim: bool,
    fail_at: Option<usize>,
}

impl MockSlave {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            transfers: Vec::new(),
            attempts: 0,
            fail_claim: false,
            fail_at: None,
        }
    }

    pub fn fail_claim(mut self) -> Self {
        self.fail_claim = true;
        self
    }

    /// Fail the transfer attempt with this index, counting from 0
    pub fn fail_byte(mut self, attempt: usize) -> Self {
        self.fail_at = Some(attempt);
        self
    }

    pub fn transfers(&self) -> Vec<(u8, XferFlags)> {
        self.transfers.clone()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.transfers.iter().map(|(b, _)| *b).collect()
    }
}

impl SpiSlave for MockSlave {
    type Error = MockError;

    fn claim_bus(&mut self) -> Result<(), Self::Error> {
        if self.fail_claim {
            return Err(MockError::Timeout);
        }
        self.journal.borrow_mut().push(Event::Claim);
        Ok(())
    }

    fn release_bus(&mut self) {
        self.journal.borrow_mut().push(Event::Release);
    }

    fn transfer_byte(&mut self, value: u8, flags: XferFlags) -> Result<(), Self::Error> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_at == Some(attempt) {
            return Err(MockError::NoDevice);
        }
        self.transfers.push((value, flags));
        self.journal.borrow_mut().push(Event::Byte(value));
        Ok(())
    }
}

pub struct MockSpiBus {
    journal: Journal,
    failing: bool,
}

impl MockSpiBus {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failing: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

impl spi::ErrorType for MockSpiBus {
    type Error = spi::ErrorKind;
}

impl spi::SpiBus for MockSpiBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if self.failing {
            return Err(spi::ErrorKind::Other);
        }
        let mut journal = self.journal.borrow_mut();
        journal.extend(words.iter().map(|b| Event::Byte(*b)));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push(Event::Flush);
        Ok(())
    }
}

/// Chip select line, records its level
pub struct MockCs {
    journal: Journal,
}

impl MockCs {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl digital::ErrorType for MockCs {
    type Error = Infallible;
}

impl digital::OutputPin for MockCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push(Event::Cs(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push(Event::Cs(true));
        Ok(())
    }
}

/// Enable line handed out by [`MockDescription`]
#[derive(Debug)]
pub struct MockPin {
    journal: Journal,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push(Event::Gpio(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.journal.borrow_mut().push(Event::Gpio(true));
        Ok(())
    }
}

pub struct MockDelay {
    journal: Journal,
}

impl MockDelay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.journal.borrow_mut().push(Event::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.journal.borrow_mut().push(Event::Delay(ms));
    }
}

/// What looking up the enable GPIO yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioLookup {
    Present,
    NotFound,
    Broken,
}

pub struct MockDescription {
    gpio: GpioLookup,
    power_on_delay: Option<u32>,
    timing: Option<DisplayTiming>,
    journal: Journal,
    requested: Vec<(String, GpioFlags)>,
}

impl MockDescription {
    pub fn new(gpio: GpioLookup) -> Self {
        Self {
            gpio,
            power_on_delay: None,
            timing: None,
            journal: journal(),
            requested: Vec::new(),
        }
    }

    pub fn power_on_delay(mut self, ms: u32) -> Self {
        self.power_on_delay = Some(ms);
        self
    }

    pub fn timing(mut self, timing: DisplayTiming) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Record the enable pin into `journal`
    pub fn journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn requested(&self) -> Vec<(String, GpioFlags)> {
        self.requested.clone()
    }
}

impl DeviceDescription for MockDescription {
    type Pin = MockPin;
    type Error = MockError;

    fn request_gpio_by_name(
        &mut self,
        name: &str,
        flags: GpioFlags,
    ) -> Result<Self::Pin, GpioRequestError<Self::Error>> {
        self.requested.push((String::from(name), flags));
        match self.gpio {
            GpioLookup::Present => Ok(MockPin {
                journal: self.journal.clone(),
            }),
            GpioLookup::NotFound => Err(GpioRequestError::NotFound),
            GpioLookup::Broken => Err(GpioRequestError::Other(MockError::NoDevice)),
        }
    }

    fn read_u32(&self, prop: &str) -> Option<u32> {
        match prop {
            POWER_ON_DELAY => self.power_on_delay,
            _ => None,
        }
    }

    fn decode_display_timing(&self) -> Option<DisplayTiming> {
        self.timing
    }
}
