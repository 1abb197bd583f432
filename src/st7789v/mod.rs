//! Driver for the Sitronix ST7789V 240x320 TFT controller on a 3-wire SPI bus.
//!
//! The panel is brought up by a fixed command sequence (sleep out, RGB565
//! pixel format, porch, gate and voltage settings, display on) whose values
//! depend on the panel batch, see [`PanelVariant`].
//!
//! ```text
//! enable GPIO high -> power-on delay -> claim bus -> init sequence
//!                  -> variant settings -> release bus
//! ```

mod command;
mod lcd;
mod sequence;
mod startup;

pub use command::{Command, Madctl, PIXEL_FMT_16BIT};
pub use lcd::{
    ConfigError, DeviceDescription, GpioFlags, GpioRequestError, LcdConfig, LcdError, LcdState,
    St7789vLcd, DEFAULT_POWER_ON_DELAY_MS, ENABLE_GPIO, NATIVE_TIMING, PANEL_BPP, POWER_ON_DELAY,
};
pub use sequence::{
    init_display, write_command, InitStep, LcdCommand, PanelVariant, SequenceReport,
    SLEEP_OUT_DELAY_MS,
};
pub use startup::{
    BringUpError, MadctlVariant, NoVariant, Rotation, Startup, StartupReport, StartupState,
    VariantHook,
};

/// Display width in pixels
pub const WIDTH: u32 = 240;
/// Display height in pixels
pub const HEIGHT: u32 = 320;

/// Driver name the device registry binds panels under
pub const DRIVER_NAME: &str = "st7789v";

/// Compatible strings in the hardware description handled by this driver
pub const OF_MATCH: &[&str] = &["sitronix,st7789v"];

/// Whether a hardware description entry is meant for this driver
pub fn matches(compatible: &str) -> bool {
    OF_MATCH.contains(&compatible)
}
