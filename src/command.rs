//! `sitronixset` console command: re-run the panel bring-up by hand.

use core::fmt::{self, Display, Formatter};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::registry::DeviceRegistry;
use crate::spi::SpiSlave;
use crate::st7789v::{LcdError, St7789vLcd, StartupReport, VariantHook, DRIVER_NAME};

/// No such device
pub const ENODEV: i32 = 19;
/// I/O error
pub const EIO: i32 = 5;

/// Console command table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmdTbl {
    pub name: &'static str,
    pub maxargs: usize,
    /// Whether pressing enter on an empty line repeats the command
    pub repeatable: bool,
    pub usage: &'static str,
    pub help: &'static str,
}

pub const SITRONIXSET: CmdTbl = CmdTbl {
    name: "sitronixset",
    maxargs: 2,
    repeatable: true,
    usage: "set sitronixdisplay",
    help: "",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// No st7789v device is bound
    NoDevice,
    /// The device has no SPI slave
    NoSlave,
    /// The bus could not be claimed or a byte failed under the abort policy
    StartupFailed,
}

impl CommandError {
    /// Negative errno style return code
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::NoDevice | CommandError::NoSlave => -ENODEV,
            CommandError::StartupFailed => -EIO,
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NoDevice => write!(f, "Could not get st7789v device"),
            CommandError::NoSlave => write!(f, "No slave data"),
            CommandError::StartupFailed => write!(f, "Display bring-up failed"),
        }
    }
}

/// Look up the bound st7789v device and run the full bring-up on its bus.
pub fn do_sitronixset<B, P, D, V>(
    registry: &mut DeviceRegistry<St7789vLcd<B, P, D, V>>,
) -> Result<StartupReport, CommandError>
where
    B: SpiSlave,
    P: OutputPin,
    D: DelayNs,
    V: VariantHook,
{
    let result = match registry.get_device_by_driver(DRIVER_NAME) {
        None => Err(CommandError::NoDevice),
        Some(lcd) => lcd.spi_startup().map_err(|err| match err {
            LcdError::NoSlave => CommandError::NoSlave,
            _ => CommandError::StartupFailed,
        }),
    };

    if let Err(err) = &result {
        #[cfg(feature = "defmt")]
        defmt::error!("do_sitronixset: {}", err);
        #[cfg(feature = "log-04")]
        log::error!("do_sitronixset: {}", err);
        let _ = err;
    }
    result
}

/// Run `sitronixset` and turn the outcome into a console return code
pub fn run_sitronixset<B, P, D, V>(registry: &mut DeviceRegistry<St7789vLcd<B, P, D, V>>) -> i32
where
    B: SpiSlave,
    P: OutputPin,
    D: DelayNs,
    V: VariantHook,
{
    match do_sitronixset(registry) {
        Ok(_) => 0,
        Err(err) => err.exit_code(),
    }
}
