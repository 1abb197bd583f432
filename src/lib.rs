#![no_std]
//! Sitronix ST7789V bring-up driver
//!
//! This library takes an SPI attached ST7789V TFT panel from reset to a
//! displaying state and exposes it to a generic display layer. It includes
//! the byte transport over a shared bus, the panel init sequence, the
//! per-device lifecycle and the `sitronixset` console command.

/// Console command re-running the bring-up.
pub mod command;

/// Display timing and the operations offered to the display layer.
pub mod display;

/// Devices bound to drivers.
pub mod registry;

/// Bus claiming and framed byte transfers.
pub mod spi;

/// ST7789V TFT controller driver.
pub mod st7789v;

#[cfg(test)]
mod mock;

extern crate alloc;
