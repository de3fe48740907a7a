//! Live display and tuning parameters
//!
//! A single [`DisplayParameters`] value is owned by the display loop and
//! passed by reference to the scheduler, processor, renderer and control
//! interpreter. Only the control interpreter produces modified copies.

use crate::error::{Error, Result};

/// Default number of FFT bins
pub const DEFAULT_BINS: usize = 512;

/// Default CS16 scale divisor (empirical, matches rtlsdr output levels)
pub const DEFAULT_SCALE: f32 = 3000.0;

/// Default stream read timeout in microseconds
pub const DEFAULT_TIMEOUT_US: i64 = 100_000;

/// Runtime parameters of the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayParameters {
    /// Sample rate in samples per second (committed on the device)
    pub sample_rate: f64,
    /// Center frequency in Hz (committed on the device)
    pub frequency: f64,
    /// Tuning step for rate and frequency, in Hz
    pub step: f64,
    /// Display refresh rate in frames per second
    pub frame_rate: f64,
    /// Decibel span mapped onto the plot height
    pub dynamic_range: f32,
    /// Decibel value mapped to the top of the plot
    pub reference_level: f32,
    /// Keep the maximum power per bin across frames
    pub peak_hold: bool,
    /// Draw the keyboard control overlay
    pub show_controls: bool,
}

impl Default for DisplayParameters {
    fn default() -> Self {
        Self {
            sample_rate: 1e6,
            frequency: 100e6,
            step: 1e5,
            frame_rate: 15.0,
            dynamic_range: 80.0,
            reference_level: 0.0,
            peak_hold: false,
            show_controls: true,
        }
    }
}

impl DisplayParameters {
    /// Check the invariants every parameter set must satisfy.
    pub fn validate(&self) -> Result<()> {
        if !self.frame_rate.is_finite() || self.frame_rate < 1.0 {
            return Err(Error::config(format!(
                "frame rate must be at least 1 fps (got {})",
                self.frame_rate
            )));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(Error::config(format!(
                "tuning step must be positive (got {})",
                self.step
            )));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::config(format!(
                "sample rate must be positive (got {})",
                self.sample_rate
            )));
        }
        if !self.frequency.is_finite() {
            return Err(Error::config("frequency must be finite"));
        }
        if !self.dynamic_range.is_finite() || !self.reference_level.is_finite() {
            return Err(Error::config("display levels must be finite"));
        }
        Ok(())
    }

    /// Time between two renders at the current frame rate.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.frame_rate.max(1.0))
    }
}
