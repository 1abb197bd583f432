use core::fmt::{self, Debug, Display, Formatter};

use bitflags::bitflags;
use embedded_graphics_core::pixelcolor::{raw::RawData, PixelColor, Rgb565};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::sequence::PanelVariant;
use super::startup::{BringUpError, NoVariant, Startup, StartupReport, VariantHook};
use super::{HEIGHT, WIDTH};
use crate::display::{DisplayOps, DisplayTiming};
use crate::spi::SpiSlave;

/// Name of the enable line in the hardware description
pub const ENABLE_GPIO: &str = "enable-gpios";
/// Property holding the power-on delay in milliseconds
pub const POWER_ON_DELAY: &str = "power-on-delay";
pub const DEFAULT_POWER_ON_DELAY_MS: u32 = 10;

/// Bit depth of the only pixel format the driver sets up
pub const PANEL_BPP: u32 = <<Rgb565 as PixelColor>::Raw as RawData>::BITS_PER_PIXEL as u32;

/// Timing used when the description has none: native geometry, no porches
pub const NATIVE_TIMING: DisplayTiming = DisplayTiming::with_resolution(WIDTH, HEIGHT);

bitflags! {
    /// How a GPIO is requested from the description
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GpioFlags: u32 {
        const IS_IN = 1 << 0;
        const IS_OUT = 1 << 1;
        /// Drive the line active (high unless ACTIVE_LOW) when requested
        const IS_OUT_ACTIVE = 1 << 2;
        const ACTIVE_LOW = 1 << 3;
    }
}

/// Failure to look up a GPIO in the hardware description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioRequestError<E> {
    /// The description has no such GPIO
    NotFound,
    /// The GPIO exists but could not be requested
    Other(E),
}

/// Static hardware description of one discovered panel
pub trait DeviceDescription {
    type Pin: OutputPin;
    type Error: Debug;

    fn request_gpio_by_name(
        &mut self,
        name: &str,
        flags: GpioFlags,
    ) -> Result<Self::Pin, GpioRequestError<Self::Error>>;

    fn read_u32(&self, prop: &str) -> Option<u32>;

    fn read_u32_default(&self, prop: &str, default: u32) -> u32 {
        self.read_u32(prop).unwrap_or(default)
    }

    /// Display timing node, if the description carries one
    fn decode_display_timing(&self) -> Option<DisplayTiming> {
        None
    }
}

/// Errors while building the configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError<E> {
    /// The enable GPIO exists but could not be requested
    Gpio(E),
    /// The device was configured before
    AlreadyConfigured,
}

impl<E: Debug> Display for ConfigError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Gpio(e) => write!(f, "cannot get enable GPIO: {:?}", e),
            ConfigError::AlreadyConfigured => write!(f, "device already configured"),
        }
    }
}

/// Errors of the display operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LcdError<E> {
    /// Configuration has not been parsed yet
    NotConfigured,
    /// The device has no SPI slave attached
    NoSlave,
    BringUp(BringUpError<E>),
}

impl<E> From<BringUpError<E>> for LcdError<E> {
    fn from(err: BringUpError<E>) -> Self {
        LcdError::BringUp(err)
    }
}

impl<E: Debug> Display for LcdError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LcdError::NotConfigured => write!(f, "device not configured"),
            LcdError::NoSlave => write!(f, "no slave data"),
            LcdError::BringUp(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LcdState {
    Discovered,
    Configured,
    Enabled,
}

/// Per-device configuration taken from the hardware description
#[derive(Debug)]
pub struct LcdConfig<P> {
    timing: DisplayTiming,
    enable: Option<P>,
    panel_bpp: u32,
    power_on_delay: u32,
}

impl<P> LcdConfig<P> {
    pub fn timing(&self) -> DisplayTiming {
        self.timing
    }

    pub fn has_enable_gpio(&self) -> bool {
        self.enable.is_some()
    }

    pub fn panel_bpp(&self) -> u32 {
        self.panel_bpp
    }

    /// Milliseconds between raising the enable line and the bring-up
    pub fn power_on_delay(&self) -> u32 {
        self.power_on_delay
    }
}

/// ST7789V panel as seen by the display layer.
///
/// `B` is the SPI slave the panel hangs off, `P` the enable line and `D` the
/// delay source shared by the power-on wait and the init sequence.
pub struct St7789vLcd<B, P, D, V = NoVariant> {
    slave: Option<B>,
    delay: D,
    config: Option<LcdConfig<P>>,
    startup: Startup<V>,
    state: LcdState,
}

impl<B, P, D> St7789vLcd<B, P, D, NoVariant>
where
    B: SpiSlave,
    P: OutputPin,
    D: DelayNs,
{
    /// A discovered, not yet configured panel
    pub fn new(slave: Option<B>, delay: D) -> Self {
        Self {
            slave,
            delay,
            config: None,
            startup: Startup::new(PanelVariant::default()),
            state: LcdState::Discovered,
        }
    }
}

impl<B, P, D, V> St7789vLcd<B, P, D, V>
where
    B: SpiSlave,
    P: OutputPin,
    D: DelayNs,
    V: VariantHook,
{
    /// Use a different bring-up setup (panel variant, byte error policy, variant hook)
    pub fn with_startup<W: VariantHook>(self, startup: Startup<W>) -> St7789vLcd<B, P, D, W> {
        St7789vLcd {
            slave: self.slave,
            delay: self.delay,
            config: self.config,
            startup,
            state: self.state,
        }
    }

    pub fn bind(&self) {
        #[cfg(feature = "defmt")]
        defmt::info!("st7789v_bind: binding");
        #[cfg(feature = "log-04")]
        log::info!("st7789v_bind: binding");
    }

    pub fn probe(&self) {
        #[cfg(feature = "defmt")]
        defmt::info!("st7789v_probe: probing");
        #[cfg(feature = "log-04")]
        log::info!("st7789v_probe: probing");
    }

    /// Build the configuration record from the hardware description.
    ///
    /// A missing enable GPIO is tolerated, any other GPIO error is fatal and
    /// leaves the device unconfigured.
    pub fn configure<S>(&mut self, desc: &mut S) -> Result<(), ConfigError<S::Error>>
    where
        S: DeviceDescription<Pin = P>,
    {
        if self.state != LcdState::Discovered {
            return Err(ConfigError::AlreadyConfigured);
        }

        let enable = match desc.request_gpio_by_name(ENABLE_GPIO, GpioFlags::IS_OUT) {
            Ok(pin) => Some(pin),
            Err(GpioRequestError::NotFound) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("st7789v: Warning: cannot get enable GPIO: not found");
                #[cfg(feature = "log-04")]
                log::warn!("st7789v: Warning: cannot get enable GPIO: not found");
                None
            }
            Err(GpioRequestError::Other(err)) => {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "st7789v: cannot get enable GPIO: {}",
                    defmt::Debug2Format(&err)
                );
                #[cfg(feature = "log-04")]
                log::error!("st7789v: cannot get enable GPIO: {:?}", err);
                return Err(ConfigError::Gpio(err));
            }
        };

        let power_on_delay = desc.read_u32_default(POWER_ON_DELAY, DEFAULT_POWER_ON_DELAY_MS);
        let timing = desc.decode_display_timing().unwrap_or(NATIVE_TIMING);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "st7789v: configured, power-on delay {=u32} ms, {=u32}x{=u32}",
            power_on_delay,
            timing.hactive,
            timing.vactive
        );
        #[cfg(feature = "log-04")]
        log::debug!(
            "st7789v: configured, power-on delay {} ms, {}x{}",
            power_on_delay,
            timing.hactive,
            timing.vactive
        );

        self.config = Some(LcdConfig {
            timing,
            enable,
            panel_bpp: PANEL_BPP,
            power_on_delay,
        });
        self.state = LcdState::Configured;
        Ok(())
    }

    pub fn state(&self) -> LcdState {
        self.state
    }

    pub fn config(&self) -> Option<&LcdConfig<P>> {
        self.config.as_ref()
    }

    pub fn startup(&self) -> &Startup<V> {
        &self.startup
    }

    pub fn slave(&self) -> Option<&B> {
        self.slave.as_ref()
    }

    pub fn slave_mut(&mut self) -> Option<&mut B> {
        self.slave.as_mut()
    }

    /// Run the bring-up sequence on the attached slave
    pub fn spi_startup(&mut self) -> Result<StartupReport, LcdError<B::Error>> {
        let slave = self.slave.as_mut().ok_or(LcdError::NoSlave)?;
        let report = self.startup.spi_startup(slave, &mut self.delay)?;
        Ok(report)
    }

    /// Tear the device down, handing back the slave and the delay
    pub fn release(self) -> (Option<B>, D) {
        (self.slave, self.delay)
    }
}

impl<B, P, D, V> DisplayOps for St7789vLcd<B, P, D, V>
where
    B: SpiSlave,
    P: OutputPin,
    D: DelayNs,
    V: VariantHook,
{
    type Error = LcdError<B::Error>;

    fn read_timing(&self) -> Result<DisplayTiming, Self::Error> {
        self.config
            .as_ref()
            .map(LcdConfig::timing)
            .ok_or(LcdError::NotConfigured)
    }

    fn enable(&mut self, bpp: u32, edid: Option<&DisplayTiming>) -> Result<(), Self::Error> {
        let config = self.config.as_mut().ok_or(LcdError::NotConfigured)?;

        if bpp != config.panel_bpp {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "st7789v: {=u32} bpp requested, panel runs at {=u32} bpp",
                bpp,
                config.panel_bpp
            );
            #[cfg(feature = "log-04")]
            log::warn!(
                "st7789v: {} bpp requested, panel runs at {} bpp",
                bpp,
                config.panel_bpp
            );
        }
        if edid.is_some() {
            #[cfg(feature = "defmt")]
            defmt::debug!("st7789v: ignoring timing hint");
            #[cfg(feature = "log-04")]
            log::debug!("st7789v: ignoring timing hint");
        }

        if let Some(pin) = config.enable.as_mut() {
            if let Err(err) = pin.set_high() {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "st7789v: cannot raise enable GPIO: {}",
                    defmt::Debug2Format(&err)
                );
                #[cfg(feature = "log-04")]
                log::warn!("st7789v: cannot raise enable GPIO: {:?}", err);
                let _ = err;
            }
        }
        let power_on_delay = config.power_on_delay;
        self.delay.delay_ms(power_on_delay);

        match self.spi_startup() {
            Ok(_) => {
                #[cfg(feature = "defmt")]
                defmt::info!("st7789v: panel enabled");
                #[cfg(feature = "log-04")]
                log::info!("st7789v: panel enabled");
                self.state = LcdState::Enabled;
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("st7789v: enable failed: {}", defmt::Debug2Format(&err));
                #[cfg(feature = "log-04")]
                log::error!("st7789v: enable failed: {}", err);
                Err(err)
            }
        }
    }
}
