//! Command definitions for the Sitronix ST7789V controller

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Interface pixel format for 16 bit/pixel (RGB565) on both the RGB and MCU interface
pub const PIXEL_FMT_16BIT: u8 = 0x55;

/// Controller commands.
///
/// The first group are standard MIPI DCS commands, the rest are ST7789V
/// specific panel registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    /// Sleep Out
    ExitSleepMode = 0x11,
    /// Display Inversion On
    EnterInvertMode = 0x21,
    /// Display On
    SetDisplayOn = 0x29,
    /// Memory Data Access Control (MADCTL)
    SetAddressMode = 0x36,
    /// Interface Pixel Format (COLMOD)
    SetPixelFormat = 0x3A,
    /// Porch Setting
    PORCTRL = 0xB2,
    /// Gate Control
    GCTRL = 0xB7,
    /// VCOM Setting
    VCOMS = 0xBB,
    /// VDV and VRH Command Enable
    VDVVRHEN = 0xC2,
    /// VRH Set
    VRHS = 0xC3,
    /// VDV Set
    VDVS = 0xC4,
    /// VCOM Offset Set
    VCMOFSET = 0xC5,
    /// Power Control 1
    PWCTRL1 = 0xD0,
    /// Positive Voltage Gamma Control
    PVGAMCTRL = 0xE0,
    /// Negative Voltage Gamma Control
    NVGAMCTRL = 0xE1,
}

impl Command {
    /// Get the command address byte
    #[inline]
    pub fn addr(self) -> u8 {
        self.into()
    }
}

bitflags! {
    /// MADCTL parameter bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Madctl: u8 {
        /// Page address order (bottom to top)
        const MY = 1 << 7;
        /// Column address order (right to left)
        const MX = 1 << 6;
        /// Page/column exchange
        const MV = 1 << 5;
        /// BGR instead of RGB color order
        const BGR = 1 << 3;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Madctl {
    fn format(&self, f: defmt::Formatter) {
        self.iter_names().for_each(|name| {
            defmt::write!(f, "{}", name);
        });
    }
}
