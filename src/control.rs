//! Keyboard control
//!
//! Key handling is split in three parts:
//!
//! - a [`KeySource`] polls at most one [`ControlEvent`] per loop iteration
//!   and never blocks;
//! - [`interpret`] is a pure mapping from the current parameters and an
//!   event to the new parameters, an optional [`DeviceCommand`], and a quit
//!   flag;
//! - [`apply_command`] sends a command to the device and commits the new
//!   value only once the device accepted it.
//!
//! | Key | Effect |
//! |---|---|
//! | r / R | sample rate -/+ step |
//! | f / F | frequency -/+ step |
//! | h / H | peak-hold off / on |
//! | l / L | reference level -10 / +10 dB |
//! | d / D | dynamic range -10 / +10 dB |
//! | s / S | frame rate -1 / +1 fps |
//! | t / T | step /2 / x2 |
//! | c / C | hide / show control overlay |
//! | q / Q | quit |
//! | up, right | frequency + step |
//! | down, left | frequency - step |

use tracing::{info, warn};

use crate::device::SdrDevice;
use crate::error::{Result, TuningError, TuningTarget};
use crate::params::DisplayParameters;

/// Direction of an arrow key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

/// A single resolved input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// A plain character key
    Key(char),
    /// An arrow key, resolved from its escape sequence
    Arrow(ArrowDirection),
}

impl std::fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlEvent::Key(c) => write!(f, "{}", c),
            ControlEvent::Arrow(dir) => write!(f, "{:?}", dir),
        }
    }
}

/// Hardware change requested by a key binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    SetFrequency(f64),
    SetSampleRate(f64),
}

/// Result of interpreting one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlOutcome {
    /// Parameters after display-only changes
    pub params: DisplayParameters,
    /// Hardware change to attempt; not yet reflected in `params`
    pub command: Option<DeviceCommand>,
    /// Stop after the current iteration
    pub quit: bool,
}

/// Map `event` onto the parameters.
///
/// Display settings change directly. Frequency and sample rate changes are
/// returned as a command holding the requested value; `params` keeps the
/// committed value until [`apply_command`] succeeds.
pub fn interpret(params: &DisplayParameters, event: ControlEvent) -> ControlOutcome {
    let mut next = params.clone();
    let mut command = None;
    let mut quit = false;

    match event {
        ControlEvent::Key(key) => match key {
            'r' => {
                let requested = params.sample_rate - params.step;
                if requested > 0.0 {
                    command = Some(DeviceCommand::SetSampleRate(requested));
                }
            }
            'R' => command = Some(DeviceCommand::SetSampleRate(params.sample_rate + params.step)),
            'f' => command = Some(DeviceCommand::SetFrequency(params.frequency - params.step)),
            'F' => command = Some(DeviceCommand::SetFrequency(params.frequency + params.step)),
            'h' => next.peak_hold = false,
            'H' => next.peak_hold = true,
            'l' => next.reference_level -= 10.0,
            'L' => next.reference_level += 10.0,
            'd' => next.dynamic_range -= 10.0,
            'D' => next.dynamic_range += 10.0,
            's' => {
                if params.frame_rate > 1.0 {
                    next.frame_rate = (params.frame_rate - 1.0).max(1.0);
                }
            }
            'S' => next.frame_rate += 1.0,
            't' => {
                if params.step / 2.0 > 1.0 {
                    next.step = params.step / 2.0;
                }
            }
            'T' => next.step *= 2.0,
            'c' => next.show_controls = false,
            'C' => next.show_controls = true,
            'q' | 'Q' => quit = true,
            _ => {}
        },
        // Up and right share one binding, as do down and left.
        ControlEvent::Arrow(ArrowDirection::Up | ArrowDirection::Right) => {
            command = Some(DeviceCommand::SetFrequency(params.frequency + params.step));
        }
        ControlEvent::Arrow(ArrowDirection::Down | ArrowDirection::Left) => {
            command = Some(DeviceCommand::SetFrequency(params.frequency - params.step));
        }
    }

    ControlOutcome {
        params: next,
        command,
        quit,
    }
}

/// Send `command` to `device` and commit it into `params` on success.
///
/// On failure `params` is left untouched and the rejection is returned.
pub fn apply_command<D: SdrDevice + ?Sized>(
    device: &mut D,
    params: &mut DisplayParameters,
    command: DeviceCommand,
) -> std::result::Result<(), TuningError> {
    let (target, requested, result) = match command {
        DeviceCommand::SetFrequency(hz) => (TuningTarget::Frequency, hz, device.set_frequency(hz)),
        DeviceCommand::SetSampleRate(sps) => {
            (TuningTarget::SampleRate, sps, device.set_sample_rate(sps))
        }
    };

    match result {
        Ok(()) => {
            match target {
                TuningTarget::Frequency => params.frequency = requested,
                TuningTarget::SampleRate => params.sample_rate = requested,
            }
            info!("{} {} ok", target, requested);
            Ok(())
        }
        Err(e) => {
            let err = TuningError {
                target,
                requested,
                reason: e.to_string(),
            };
            warn!("{}", err);
            Err(err)
        }
    }
}

/// Non-blocking source of keyboard events.
pub trait KeySource {
    /// Return the next pending event, or `None` without waiting.
    fn poll_event(&mut self) -> Result<Option<ControlEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StreamRead;
    use crate::error::{Error, StreamReadError};

    fn key(c: char) -> ControlEvent {
        ControlEvent::Key(c)
    }

    #[derive(Default)]
    struct Tuner {
        reject: bool,
        frequencies: Vec<f64>,
        rates: Vec<f64>,
    }

    impl SdrDevice for Tuner {
        fn set_frequency(&mut self, frequency: f64) -> Result<()> {
            self.frequencies.push(frequency);
            if self.reject {
                return Err(Error::device("out of range"));
            }
            Ok(())
        }
        fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
            self.rates.push(sample_rate);
            if self.reject {
                return Err(Error::device("unsupported rate"));
            }
            Ok(())
        }
        fn read_stream(
            &mut self,
            _buffer: &mut [i16],
            _timeout_us: i64,
        ) -> std::result::Result<StreamRead, StreamReadError> {
            Err(StreamReadError::Driver("not streaming".into()))
        }
        fn deactivate_stream(&mut self) -> Result<()> {
            Ok(())
        }
        fn close_stream(&mut self) -> Result<()> {
            Ok(())
        }
        fn release(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_display_bindings() {
        let params = DisplayParameters::default();
        assert!(interpret(&params, key('H')).params.peak_hold);
        assert!(!interpret(&params, key('c')).params.show_controls);
        assert_eq!(interpret(&params, key('l')).params.reference_level, -10.0);
        assert_eq!(interpret(&params, key('L')).params.reference_level, 10.0);
        assert_eq!(interpret(&params, key('d')).params.dynamic_range, 70.0);
        assert_eq!(interpret(&params, key('D')).params.dynamic_range, 90.0);
        assert_eq!(interpret(&params, key('S')).params.frame_rate, 16.0);
        assert_eq!(interpret(&params, key('T')).params.step, 2e5);
        assert_eq!(interpret(&params, key('t')).params.step, 5e4);
        for c in ['H', 'c', 'l', 'd', 's', 't'] {
            assert!(interpret(&params, key(c)).command.is_none());
        }
    }

    #[test]
    fn test_quit_keys() {
        let params = DisplayParameters::default();
        assert!(interpret(&params, key('q')).quit);
        assert!(interpret(&params, key('Q')).quit);
        assert!(!interpret(&params, key('x')).quit);
        assert_eq!(interpret(&params, key('x')).params, params);
    }

    #[test]
    fn test_frame_rate_floor() {
        let mut params = DisplayParameters {
            frame_rate: 3.0,
            ..Default::default()
        };
        for _ in 0..10 {
            params = interpret(&params, key('s')).params;
            assert!(params.frame_rate >= 1.0);
        }
        assert_eq!(params.frame_rate, 1.0);

        let fractional = DisplayParameters {
            frame_rate: 1.5,
            ..Default::default()
        };
        assert_eq!(interpret(&fractional, key('s')).params.frame_rate, 1.0);
    }

    #[test]
    fn test_step_floor() {
        let mut params = DisplayParameters {
            step: 37.0,
            ..Default::default()
        };
        for _ in 0..20 {
            params = interpret(&params, key('t')).params;
            assert!(params.step > 1.0);
        }
    }

    #[test]
    fn test_sample_rate_decrement_rejected_at_zero() {
        let params = DisplayParameters {
            sample_rate: 1e5,
            step: 1e5,
            ..Default::default()
        };
        let outcome = interpret(&params, key('r'));
        assert!(outcome.command.is_none());
        assert_eq!(outcome.params.sample_rate, 1e5);

        let params = DisplayParameters {
            sample_rate: 2e5,
            step: 1e5,
            ..Default::default()
        };
        assert_eq!(
            interpret(&params, key('r')).command,
            Some(DeviceCommand::SetSampleRate(1e5))
        );
    }

    #[test]
    fn test_hardware_keys_do_not_commit() {
        let params = DisplayParameters::default();
        let outcome = interpret(&params, key('F'));
        assert_eq!(
            outcome.command,
            Some(DeviceCommand::SetFrequency(100.1e6))
        );
        assert_eq!(outcome.params.frequency, 100e6);
        assert_eq!(
            interpret(&params, key('R')).command,
            Some(DeviceCommand::SetSampleRate(1.1e6))
        );
    }

    #[test]
    fn test_arrow_pairs_share_bindings() {
        let params = DisplayParameters::default();
        let up = interpret(&params, ControlEvent::Arrow(ArrowDirection::Up)).command;
        let right = interpret(&params, ControlEvent::Arrow(ArrowDirection::Right)).command;
        let down = interpret(&params, ControlEvent::Arrow(ArrowDirection::Down)).command;
        let left = interpret(&params, ControlEvent::Arrow(ArrowDirection::Left)).command;
        assert_eq!(up, Some(DeviceCommand::SetFrequency(100.1e6)));
        assert_eq!(up, right);
        assert_eq!(down, Some(DeviceCommand::SetFrequency(99.9e6)));
        assert_eq!(down, left);
    }

    #[test]
    fn test_apply_commits_on_success() {
        let mut device = Tuner::default();
        let mut params = DisplayParameters::default();
        for _ in 0..3 {
            let command = interpret(&params, key('F')).command.unwrap();
            apply_command(&mut device, &mut params, command).unwrap();
        }
        assert_eq!(device.frequencies, vec![100_100_000.0, 100_200_000.0, 100_300_000.0]);
        assert_eq!(params.frequency, 100_300_000.0);
    }

    #[test]
    fn test_apply_keeps_committed_value_on_failure() {
        let mut device = Tuner {
            reject: true,
            ..Default::default()
        };
        let mut params = DisplayParameters::default();
        let err = apply_command(&mut device, &mut params, DeviceCommand::SetSampleRate(2e6))
            .unwrap_err();
        assert_eq!(err.target, TuningTarget::SampleRate);
        assert_eq!(err.requested, 2e6);
        assert!(err.reason.contains("unsupported rate"));
        assert_eq!(params.sample_rate, 1e6);

        // The next attempt starts again from the committed value.
        let command = interpret(&params, key('F')).command.unwrap();
        assert_eq!(command, DeviceCommand::SetFrequency(100.1e6));
        assert!(apply_command(&mut device, &mut params, command).is_err());
        assert_eq!(params.frequency, 100e6);
    }
}
