//! What the generic display layer expects from a panel driver.

use bitflags::bitflags;

bitflags! {
    /// Signal polarities and modes of a display timing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DisplayFlags: u32 {
        const HSYNC_LOW = 1 << 0;
        const HSYNC_HIGH = 1 << 1;
        const VSYNC_LOW = 1 << 2;
        const VSYNC_HIGH = 1 << 3;
        /// Data enable active low
        const DE_LOW = 1 << 4;
        const DE_HIGH = 1 << 5;
        /// Pixel data sampled on the rising clock edge
        const PIXDATA_POSEDGE = 1 << 6;
        const PIXDATA_NEGEDGE = 1 << 7;
        const INTERLACED = 1 << 8;
        const DOUBLESCAN = 1 << 9;
        const DOUBLECLK = 1 << 10;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DisplayFlags {
    fn format(&self, f: defmt::Formatter) {
        self.iter_names().for_each(|name| {
            defmt::write!(f, "{}", name);
        });
    }
}

/// Video timing of a panel. Horizontal values are in pixels, vertical in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayTiming {
    /// Pixel clock in Hz
    pub pixelclock: u32,
    pub hactive: u32,
    pub hfront_porch: u32,
    pub hback_porch: u32,
    pub hsync_len: u32,
    pub vactive: u32,
    pub vfront_porch: u32,
    pub vback_porch: u32,
    pub vsync_len: u32,
    pub flags: DisplayFlags,
    pub hdmi_monitor: bool,
}

impl DisplayTiming {
    /// Timing with only the active area set
    pub const fn with_resolution(hactive: u32, vactive: u32) -> Self {
        Self {
            pixelclock: 0,
            hactive,
            hfront_porch: 0,
            hback_porch: 0,
            hsync_len: 0,
            vactive,
            vfront_porch: 0,
            vback_porch: 0,
            vsync_len: 0,
            flags: DisplayFlags::empty(),
            hdmi_monitor: false,
        }
    }
}

/// Operations a display driver offers to the video/console layer
pub trait DisplayOps {
    type Error;

    /// Copy of the panel timing
    fn read_timing(&self) -> Result<DisplayTiming, Self::Error>;

    /// Power the panel up and bring it into a displaying state.
    ///
    /// `bpp` is the bit depth the caller wants to use and `edid` an optional
    /// timing hint from the caller.
    fn enable(&mut self, bpp: u32, edid: Option<&DisplayTiming>) -> Result<(), Self::Error>;
}
