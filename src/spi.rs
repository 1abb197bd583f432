//! Byte transport to the panel.
//!
//! Every byte leaves the host as its own BEGIN..END framed transfer. The bus
//! must be claimed through a [`BusHandle`] first, which gives it back when it
//! goes out of scope.

use core::fmt::{self, Debug, Display, Formatter};

use bitflags::bitflags;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

bitflags! {
    /// Framing of a single transfer
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct XferFlags: u8 {
        /// Assert chip select before clocking out data
        const BEGIN = 1 << 0;
        /// Flush the bus and deassert chip select afterwards
        const END = 1 << 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for XferFlags {
    fn format(&self, f: defmt::Formatter) {
        self.iter_names().for_each(|name| {
            defmt::write!(f, "{}", name);
        });
    }
}

/// What to do when one byte of a multi-byte write fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteErrorPolicy {
    /// Log the failure and keep sending the remaining bytes
    #[default]
    Continue,
    /// Stop at the first failed byte and return its error
    Abort,
}

/// A serial bus shared with other users, as seen by one chip select.
pub trait SpiSlave {
    type Error: Debug;

    /// Take exclusive ownership of the bus
    fn claim_bus(&mut self) -> Result<(), Self::Error>;

    /// Give the bus back. Must be safe to call after a failed transfer.
    fn release_bus(&mut self);

    /// Clock out one 8-bit word, framed according to `flags`
    fn transfer_byte(&mut self, value: u8, flags: XferFlags) -> Result<(), Self::Error>;
}

impl<T: SpiSlave + ?Sized> SpiSlave for &mut T {
    type Error = T::Error;

    fn claim_bus(&mut self) -> Result<(), Self::Error> {
        T::claim_bus(self)
    }

    fn release_bus(&mut self) {
        T::release_bus(self)
    }

    fn transfer_byte(&mut self, value: u8, flags: XferFlags) -> Result<(), Self::Error> {
        T::transfer_byte(self, value, flags)
    }
}

/// A byte the bus refused to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportError<E> {
    /// The byte that was being written
    pub value: u8,
    /// Error reported by the bus
    pub error: E,
}

impl<E: Debug> Display for TransportError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "failed to send {:#04x}: {:?}", self.value, self.error)
    }
}

/// Scoped claim on a [`SpiSlave`].
///
/// Only obtainable through a successful [`BusHandle::claim`]; the bus is
/// released when the handle is dropped, whichever way the caller leaves.
pub struct BusHandle<'a, B: SpiSlave> {
    slave: &'a mut B,
}

impl<'a, B: SpiSlave> BusHandle<'a, B> {
    pub fn claim(slave: &'a mut B) -> Result<Self, B::Error> {
        slave.claim_bus()?;
        Ok(Self { slave })
    }

    /// Send one byte as a complete transfer
    pub fn write_u8(&mut self, value: u8) -> Result<(), TransportError<B::Error>> {
        self.slave
            .transfer_byte(value, XferFlags::BEGIN | XferFlags::END)
            .map_err(|error| {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "write_u8: Failed to send {=u8:#x}: {}",
                    value,
                    defmt::Debug2Format(&error)
                );
                #[cfg(feature = "log-04")]
                log::debug!("write_u8: Failed to send {:#04x}: {:?}", value, error);
                TransportError { value, error }
            })
    }

    /// Send `buf` byte by byte.
    ///
    /// Returns how many bytes failed. Under [`ByteErrorPolicy::Abort`] the
    /// first failure is returned instead and the rest of `buf` is not sent.
    pub fn write_u8_array(
        &mut self,
        buf: &[u8],
        policy: ByteErrorPolicy,
    ) -> Result<usize, TransportError<B::Error>> {
        let mut failed = 0;
        for &value in buf {
            if let Err(err) = self.write_u8(value) {
                match policy {
                    ByteErrorPolicy::Continue => failed += 1,
                    ByteErrorPolicy::Abort => return Err(err),
                }
            }
        }
        Ok(failed)
    }
}

impl<B: SpiSlave> Drop for BusHandle<'_, B> {
    fn drop(&mut self) {
        self.slave.release_bus();
    }
}

/// Errors of [`SpiBusSlave`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveError<S, C> {
    /// The SPI peripheral failed
    Spi(S),
    /// The chip select line could not be driven
    ChipSelect(C),
    /// The bus is already claimed
    Busy,
    /// A transfer was attempted without claiming the bus
    NotClaimed,
}

impl<S: Debug, C: Debug> Display for SlaveError<S, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SlaveError::Spi(e) => write!(f, "SPI error: {:?}", e),
            SlaveError::ChipSelect(e) => write!(f, "chip select error: {:?}", e),
            SlaveError::Busy => write!(f, "bus already claimed"),
            SlaveError::NotClaimed => write!(f, "bus not claimed"),
        }
    }
}

/// [`SpiSlave`] on top of an exclusive `SpiBus` and a chip select pin.
///
/// Chip select is active low. It is driven high again on release so a
/// transfer that failed half way never leaves the panel selected.
#[derive(Debug)]
pub struct SpiBusSlave<SPI, CS> {
    spi: SPI,
    cs: CS,
    claimed: bool,
}

impl<SPI, CS> SpiBusSlave<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            claimed: false,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Hand back the bus and chip select pin
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> SpiSlave for SpiBusSlave<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    type Error = SlaveError<SPI::Error, CS::Error>;

    fn claim_bus(&mut self) -> Result<(), Self::Error> {
        if self.claimed {
            return Err(SlaveError::Busy);
        }
        self.claimed = true;
        Ok(())
    }

    fn release_bus(&mut self) {
        if !self.claimed {
            return;
        }
        let _ = self.cs.set_high();
        self.claimed = false;
    }

    fn transfer_byte(&mut self, value: u8, flags: XferFlags) -> Result<(), Self::Error> {
        if !self.claimed {
            return Err(SlaveError::NotClaimed);
        }
        if flags.contains(XferFlags::BEGIN) {
            self.cs.set_low().map_err(SlaveError::ChipSelect)?;
        }
        self.spi.write(&[value]).map_err(SlaveError::Spi)?;
        if flags.contains(XferFlags::END) {
            self.spi.flush().map_err(SlaveError::Spi)?;
            self.cs.set_high().map_err(SlaveError::ChipSelect)?;
        }
        Ok(())
    }
}
