use embedded_hal::delay::DelayNs;

use super::command::{Command, PIXEL_FMT_16BIT};
use crate::spi::{BusHandle, ByteErrorPolicy, SpiSlave, TransportError};

/// Settle time the controller needs after Sleep Out before it accepts further commands
pub const SLEEP_OUT_DELAY_MS: u32 = 120;

/// Panel batch the build targets.
///
/// Selects the porch, gate and VCOM values and whether colors are inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelVariant {
    /// Non-IPS panel
    Standard,
    /// HSD20 IPS panel, needs color inversion
    Ips,
}

impl PanelVariant {
    /// Variant selected by the `standard-panel` feature
    pub const fn from_build() -> Self {
        if cfg!(feature = "standard-panel") {
            PanelVariant::Standard
        } else {
            PanelVariant::Ips
        }
    }

    /// Complete bring-up sequence for this panel
    pub fn init_sequence(self) -> &'static [InitStep] {
        match self {
            PanelVariant::Standard => STANDARD_INIT_SEQUENCE,
            PanelVariant::Ips => IPS_INIT_SEQUENCE,
        }
    }
}

impl Default for PanelVariant {
    fn default() -> Self {
        Self::from_build()
    }
}

/// One command with its parameter bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcdCommand {
    /// Command opcode
    pub cmd: Command,
    /// Command parameters
    pub params: &'static [u8],
}

impl LcdCommand {
    pub const fn new(cmd: Command, params: &'static [u8]) -> Self {
        Self { cmd, params }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    Write(LcdCommand),
    DelayMs(u32),
}

const fn write(cmd: Command, params: &'static [u8]) -> InitStep {
    InitStep::Write(LcdCommand::new(cmd, params))
}

/// HSD20 IPS panel
const IPS_INIT_SEQUENCE: &[InitStep] = &[
    write(Command::ExitSleepMode, &[]),
    InitStep::DelayMs(SLEEP_OUT_DELAY_MS),
    write(Command::SetPixelFormat, &[PIXEL_FMT_16BIT]),
    write(Command::PORCTRL, &[0x05, 0x05, 0x00, 0x33, 0x33]),
    // VGH = 13.26V, VGL = -10.43V
    write(Command::GCTRL, &[0x75]),
    // VDV and VRH come from command write instead of NVM
    write(Command::VDVVRHEN, &[0x01, 0xFF]),
    // VAP = 4.1V + (VCOM + VCOM offset + 0.5 * VDV)
    // VAN = -4.1V + (VCOM + VCOM offset + 0.5 * VDV)
    write(Command::VRHS, &[0x13]),
    // VDV = 0V
    write(Command::VDVS, &[0x20]),
    write(Command::VCOMS, &[0x22]),
    // VCOM offset = 0V
    write(Command::VCMOFSET, &[0x20]),
    // AVDD = 6.8V, AVCL = -4.8V, VDS = 2.3V
    write(Command::PWCTRL1, &[0xA4, 0xA1]),
    write(Command::SetDisplayOn, &[]),
    write(Command::EnterInvertMode, &[]),
];

/// Non-IPS panel
const STANDARD_INIT_SEQUENCE: &[InitStep] = &[
    write(Command::ExitSleepMode, &[]),
    InitStep::DelayMs(SLEEP_OUT_DELAY_MS),
    write(Command::SetPixelFormat, &[PIXEL_FMT_16BIT]),
    write(Command::PORCTRL, &[0x08, 0x08, 0x00, 0x22, 0x22]),
    write(Command::GCTRL, &[0x35]),
    write(Command::VDVVRHEN, &[0x01, 0xFF]),
    write(Command::VRHS, &[0x0B]),
    write(Command::VDVS, &[0x20]),
    // VCOM = 0.9V
    write(Command::VCOMS, &[0x20]),
    write(Command::VCMOFSET, &[0x20]),
    write(Command::PWCTRL1, &[0xA4, 0xA1]),
    write(Command::SetDisplayOn, &[]),
];

/// Outcome of one pass through the init sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceReport {
    /// Commands sent, including their parameters
    pub commands: usize,
    /// Bytes the bus reported as failed
    pub failed_bytes: usize,
}

/// Send one command byte followed by its parameters
pub fn write_command<B: SpiSlave>(
    bus: &mut BusHandle<'_, B>,
    cmd: &LcdCommand,
    policy: ByteErrorPolicy,
) -> Result<usize, TransportError<B::Error>> {
    let failed = bus.write_u8_array(&[cmd.cmd.addr()], policy)?;
    Ok(failed + bus.write_u8_array(cmd.params, policy)?)
}

/// Run the init sequence of `variant` on a claimed bus.
///
/// Under [`ByteErrorPolicy::Continue`] every step runs regardless of failed
/// bytes; the failures are only counted.
pub fn init_display<B: SpiSlave, D: DelayNs>(
    bus: &mut BusHandle<'_, B>,
    delay: &mut D,
    variant: PanelVariant,
    policy: ByteErrorPolicy,
) -> Result<SequenceReport, TransportError<B::Error>> {
    let mut report = SequenceReport::default();
    for step in variant.init_sequence() {
        match step {
            InitStep::Write(cmd) => {
                report.failed_bytes += write_command(bus, cmd, policy)?;
                report.commands += 1;
            }
            InitStep::DelayMs(ms) => delay.delay_ms(*ms),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{journal, Event, MockDelay, MockSlave};
    use alloc::vec;
    use alloc::vec::Vec;

    fn run(variant: PanelVariant, slave: &mut MockSlave, delay: &mut MockDelay) -> SequenceReport {
        let mut bus = BusHandle::claim(slave).unwrap();
        init_display(&mut bus, delay, variant, ByteErrorPolicy::Continue).unwrap()
    }

    fn bytes_after_delay(events: &[Event]) -> (Vec<u8>, Vec<u8>) {
        let split = events
            .iter()
            .position(|e| *e == Event::Delay(SLEEP_OUT_DELAY_MS))
            .unwrap();
        let collect = |events: &[Event]| {
            events
                .iter()
                .filter_map(|e| match e {
                    Event::Byte(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<u8>>()
        };
        (collect(&events[..split]), collect(&events[split + 1..]))
    }

    #[test]
    fn test_ips_sequence_bytes() {
        let log = journal();
        let mut slave = MockSlave::new(&log);
        let mut delay = MockDelay::new(&log);
        let report = run(PanelVariant::Ips, &mut slave, &mut delay);

        assert_eq!(
            slave.bytes(),
            vec![
                0x11, // sleep out
                0x3A, 0x55, // RGB565
                0xB2, 0x05, 0x05, 0x00, 0x33, 0x33, // PORCTRL
                0xB7, 0x75, // GCTRL
                0xC2, 0x01, 0xFF, // VDVVRHEN
                0xC3, 0x13, // VRHS
                0xC4, 0x20, // VDVS
                0xBB, 0x22, // VCOMS
                0xC5, 0x20, // VCMOFSET
                0xD0, 0xA4, 0xA1, // PWCTRL1
                0x29, // display on
                0x21, // invert on
            ]
        );
        assert_eq!(
            report,
            SequenceReport {
                commands: 12,
                failed_bytes: 0
            }
        );
    }

    #[test]
    fn test_standard_sequence_bytes() {
        let log = journal();
        let mut slave = MockSlave::new(&log);
        let mut delay = MockDelay::new(&log);
        let report = run(PanelVariant::Standard, &mut slave, &mut delay);

        assert_eq!(
            slave.bytes(),
            vec![
                0x11, // sleep out
                0x3A, 0x55, // RGB565
                0xB2, 0x08, 0x08, 0x00, 0x22, 0x22, // PORCTRL
                0xB7, 0x35, // GCTRL
                0xC2, 0x01, 0xFF, // VDVVRHEN
                0xC3, 0x0B, // VRHS
                0xC4, 0x20, // VDVS
                0xBB, 0x20, // VCOMS
                0xC5, 0x20, // VCMOFSET
                0xD0, 0xA4, 0xA1, // PWCTRL1
                0x29, // display on
            ]
        );
        assert_eq!(report.commands, 11);
        assert!(!slave.bytes().contains(&Command::EnterInvertMode.addr()));
    }

    #[test]
    fn test_sleep_out_delay_once_before_next_command() {
        for variant in [PanelVariant::Ips, PanelVariant::Standard] {
            let log = journal();
            let mut slave = MockSlave::new(&log);
            let mut delay = MockDelay::new(&log);
            run(variant, &mut slave, &mut delay);

            let events = log.borrow();
            let delays: Vec<&Event> = events
                .iter()
                .filter(|e| matches!(e, Event::Delay(_)))
                .collect();
            assert_eq!(delays, vec![&Event::Delay(SLEEP_OUT_DELAY_MS)]);

            let (before, after) = bytes_after_delay(&events);
            assert_eq!(before, vec![0x11]);
            assert_eq!(after.first(), Some(&0x3A));
        }
    }

    #[test]
    fn test_continue_policy_finishes_sequence() {
        let log = journal();
        // fail the PORCTRL opcode
        let mut slave = MockSlave::new(&log).fail_byte(3);
        let mut delay = MockDelay::new(&log);
        let report = run(PanelVariant::Ips, &mut slave, &mut delay);

        assert_eq!(report.failed_bytes, 1);
        assert_eq!(report.commands, 12);
        assert_eq!(slave.bytes().last(), Some(&0x21));
        assert_eq!(slave.bytes().len(), 26);
    }

    #[test]
    fn test_abort_policy_stops_sequence() {
        let log = journal();
        let mut slave = MockSlave::new(&log).fail_byte(3);
        let mut delay = MockDelay::new(&log);
        let err = {
            let mut bus = BusHandle::claim(&mut slave).unwrap();
            init_display(&mut bus, &mut delay, PanelVariant::Ips, ByteErrorPolicy::Abort)
                .unwrap_err()
        };
        assert_eq!(err.value, 0xB2);
        assert_eq!(slave.bytes(), vec![0x11, 0x3A, 0x55]);
        assert_eq!(log.borrow().last(), Some(&Event::Release));
    }

    #[test]
    fn test_default_variant_follows_build() {
        #[cfg(feature = "standard-panel")]
        assert_eq!(PanelVariant::default(), PanelVariant::Standard);
        #[cfg(not(feature = "standard-panel"))]
        assert_eq!(PanelVariant::default(), PanelVariant::Ips);
    }

    #[test]
    fn test_tables_share_fixed_registers() {
        let fixed = |variant: PanelVariant, cmd: Command| {
            variant.init_sequence().iter().find_map(|step| match step {
                InitStep::Write(c) if c.cmd == cmd => Some(c.params),
                _ => None,
            })
        };
        for cmd in [
            Command::SetPixelFormat,
            Command::VDVVRHEN,
            Command::VDVS,
            Command::VCMOFSET,
            Command::PWCTRL1,
        ] {
            assert_eq!(
                fixed(PanelVariant::Ips, cmd),
                fixed(PanelVariant::Standard, cmd)
            );
        }
    }
}
