use core::fmt::{self, Debug, Display, Formatter};

use embedded_hal::delay::DelayNs;

use super::command::{Command, Madctl};
use super::sequence::{init_display, PanelVariant, SequenceReport};
use crate::spi::{BusHandle, ByteErrorPolicy, SpiSlave, TransportError};

/// Where a bring-up run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupState {
    Idle,
    BusAcquired,
    Sequencing,
    VariantApplied,
}

/// Errors of a bring-up run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError<E> {
    /// The bus could not be claimed, nothing was sent
    Claim(E),
    /// A byte failed under [`ByteErrorPolicy::Abort`]
    Transport(TransportError<E>),
}

impl<E> From<TransportError<E>> for BringUpError<E> {
    fn from(err: TransportError<E>) -> Self {
        BringUpError::Transport(err)
    }
}

impl<E: Debug> Display for BringUpError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BringUpError::Claim(e) => write!(f, "cannot claim bus: {:?}", e),
            BringUpError::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Panel settings applied after the init sequence, while the bus is still held.
pub trait VariantHook {
    /// Returns the number of failed bytes
    fn apply<B: SpiSlave>(
        &mut self,
        bus: &mut BusHandle<'_, B>,
        policy: ByteErrorPolicy,
    ) -> Result<usize, TransportError<B::Error>>;
}

/// Leaves the controller as the init sequence configured it
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariant;

impl VariantHook for NoVariant {
    fn apply<B: SpiSlave>(
        &mut self,
        _bus: &mut BusHandle<'_, B>,
        _policy: ByteErrorPolicy,
    ) -> Result<usize, TransportError<B::Error>> {
        Ok(0)
    }
}

/// Display rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    fn madctl(self) -> Madctl {
        match self {
            Rotation::Deg0 => Madctl::empty(),
            Rotation::Deg90 => Madctl::MX | Madctl::MV,
            Rotation::Deg180 => Madctl::MX | Madctl::MY,
            Rotation::Deg270 => Madctl::MY | Madctl::MV,
        }
    }
}

/// Writes rotation and color order through MADCTL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MadctlVariant {
    madctl: Madctl,
}

impl MadctlVariant {
    pub fn new(rotation: Rotation, bgr: bool) -> Self {
        let mut madctl = rotation.madctl();
        madctl.set(Madctl::BGR, bgr);
        Self { madctl }
    }

    pub fn madctl(&self) -> Madctl {
        self.madctl
    }
}

impl VariantHook for MadctlVariant {
    fn apply<B: SpiSlave>(
        &mut self,
        bus: &mut BusHandle<'_, B>,
        policy: ByteErrorPolicy,
    ) -> Result<usize, TransportError<B::Error>> {
        let failed = bus.write_u8_array(&[Command::SetAddressMode.addr()], policy)?;
        Ok(failed + bus.write_u8_array(&[self.madctl.bits()], policy)?)
    }
}

/// Outcome of a bring-up run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartupReport {
    /// Init sequence result
    pub sequence: SequenceReport,
    /// Bytes that failed while applying the variant settings
    pub variant_failed_bytes: usize,
}

impl StartupReport {
    pub fn failed_bytes(&self) -> usize {
        self.sequence.failed_bytes + self.variant_failed_bytes
    }
}

/// Claims the bus, configures the panel and releases the bus again.
#[derive(Debug, Clone)]
pub struct Startup<V = NoVariant> {
    variant: PanelVariant,
    policy: ByteErrorPolicy,
    hook: V,
    state: StartupState,
}

impl Startup<NoVariant> {
    pub fn new(variant: PanelVariant) -> Self {
        Self {
            variant,
            policy: ByteErrorPolicy::default(),
            hook: NoVariant,
            state: StartupState::Idle,
        }
    }
}

impl Default for Startup<NoVariant> {
    fn default() -> Self {
        Self::new(PanelVariant::default())
    }
}

impl<V: VariantHook> Startup<V> {
    pub fn with_policy(mut self, policy: ByteErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the variant settings applied after the init sequence
    pub fn with_hook<W: VariantHook>(self, hook: W) -> Startup<W> {
        Startup {
            variant: self.variant,
            policy: self.policy,
            hook,
            state: self.state,
        }
    }

    pub fn variant(&self) -> PanelVariant {
        self.variant
    }

    pub fn policy(&self) -> ByteErrorPolicy {
        self.policy
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    pub fn hook(&self) -> &V {
        &self.hook
    }

    /// Run the full bring-up on `slave`.
    ///
    /// The bus is released on every path out of this function. Failed bytes
    /// are only logged unless the policy is [`ByteErrorPolicy::Abort`].
    pub fn spi_startup<B: SpiSlave, D: DelayNs>(
        &mut self,
        slave: &mut B,
        delay: &mut D,
    ) -> Result<StartupReport, BringUpError<B::Error>> {
        self.state = StartupState::Idle;
        let mut bus = match BusHandle::claim(slave) {
            Ok(bus) => bus,
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "spi_startup: cannot claim bus: {}",
                    defmt::Debug2Format(&err)
                );
                #[cfg(feature = "log-04")]
                log::error!("spi_startup: cannot claim bus: {:?}", err);
                return Err(BringUpError::Claim(err));
            }
        };
        self.transition(StartupState::BusAcquired);

        let result = self.configure(&mut bus, delay);
        drop(bus);
        self.transition(StartupState::Idle);

        let report = result?;
        if report.failed_bytes() > 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "spi_startup: {=usize} byte(s) were not sent",
                report.failed_bytes()
            );
            #[cfg(feature = "log-04")]
            log::warn!(
                "spi_startup: {} byte(s) were not sent",
                report.failed_bytes()
            );
        }
        Ok(report)
    }

    fn configure<B: SpiSlave, D: DelayNs>(
        &mut self,
        bus: &mut BusHandle<'_, B>,
        delay: &mut D,
    ) -> Result<StartupReport, TransportError<B::Error>> {
        self.transition(StartupState::Sequencing);
        let sequence = init_display(bus, delay, self.variant, self.policy)?;
        let variant_failed_bytes = self.hook.apply(bus, self.policy)?;
        self.transition(StartupState::VariantApplied);
        Ok(StartupReport {
            sequence,
            variant_failed_bytes,
        })
    }

    fn transition(&mut self, next: StartupState) {
        #[cfg(feature = "defmt")]
        defmt::trace!("st7789v: {} -> {}", self.state, next);
        #[cfg(feature = "log-04")]
        log::trace!("st7789v: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
