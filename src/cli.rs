//! Command line options

use std::path::PathBuf;

use clap::{ArgAction, Parser, builder::BoolishValueParser};

use crate::analyzer::StreamOptions;
use crate::error::{Error, Result};
use crate::params::{DEFAULT_BINS, DEFAULT_SCALE, DEFAULT_TIMEOUT_US, DisplayParameters};

/// Printed at startup and above the help text
pub const BANNER: &str = "retrogram~soapysdr - ASCII Art Spectrum Analysis for SoapySDR";

/// Accepted FFT sizes
const MIN_BINS: usize = 16;
const MAX_BINS: usize = 65536;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Wideband spectrum analyzer on your terminal with ASCII art",
    long_about = None,
    before_help = BANNER
)]
pub struct Args {
    /// Device index in the enumeration list
    #[arg(long, default_value_t = 0)]
    pub dev: usize,

    /// Sample rate in samples per second (accepts k/M/G suffix, e.g. 2.4M)
    #[arg(long, default_value = "1e6", value_parser = parse_hz)]
    pub rate: f64,

    /// Center frequency in Hz (accepts k/M/G suffix, e.g. 100.1M)
    #[arg(long, default_value = "100e6", value_parser = parse_hz)]
    pub freq: f64,

    /// Display refresh rate in frames per second
    #[arg(long, default_value_t = 15.0)]
    pub frame_rate: f64,

    /// Keep the maximum power per bin across frames
    #[arg(
        long,
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub peak_hold: bool,

    /// Reference level in dB at the top of the plot (can be negative)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub ref_lvl: f32,

    /// Dynamic range of the plot in dB
    #[arg(long, default_value_t = 80.0)]
    pub dyn_rng: f32,

    /// Tuning step for rate and frequency in Hz (accepts k/M/G suffix)
    #[arg(long, default_value = "1e5", value_parser = parse_hz)]
    pub step: f64,

    /// Draw the keyboard control overlay
    #[arg(
        long,
        default_value = "true",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub show_controls: bool,

    /// FFT size (power of two)
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,

    /// Divisor turning CS16 values into unit-scale samples
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    pub scale: f32,

    /// Stream read timeout in microseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_US)]
    pub timeout_us: i64,

    /// SoapySDR enumeration filter (e.g., "driver=rtlsdr")
    #[arg(long, default_value = "")]
    pub args: String,

    /// Replay a CS16 I/Q recording instead of opening a device
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file (stderr is silent while the display runs)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Build and validate the initial display parameters.
    pub fn into_parameters(&self) -> Result<DisplayParameters> {
        let params = DisplayParameters {
            sample_rate: self.rate,
            frequency: self.freq,
            step: self.step,
            frame_rate: self.frame_rate,
            dynamic_range: self.dyn_rng,
            reference_level: self.ref_lvl,
            peak_hold: self.peak_hold,
            show_controls: self.show_controls,
        };
        params.validate()?;
        Ok(params)
    }

    /// Build and validate the stream settings.
    pub fn stream_options(&self) -> Result<StreamOptions> {
        if !self.bins.is_power_of_two() || !(MIN_BINS..=MAX_BINS).contains(&self.bins) {
            return Err(Error::config(format!(
                "bins must be a power of two between {} and {} (got {})",
                MIN_BINS, MAX_BINS, self.bins
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::config(format!(
                "scale must be positive (got {})",
                self.scale
            )));
        }
        if self.timeout_us <= 0 {
            return Err(Error::config(format!(
                "timeout must be positive (got {} us)",
                self.timeout_us
            )));
        }
        Ok(StreamOptions {
            bins: self.bins,
            scale: self.scale,
            timeout_us: self.timeout_us,
        })
    }
}

/// Parse a value in Hz with an optional k, M or G suffix.
pub fn parse_hz(s: &str) -> std::result::Result<f64, String> {
    let s = s.trim();
    let (digits, multiplier) = if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1e9)
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1e6)
    } else if let Some(stripped) = s.strip_suffix('k') {
        (stripped, 1e3)
    } else {
        (s, 1.0)
    };
    let val: f64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value in Hz: {:?}", s))?;
    if !val.is_finite() {
        return Err(format!("Invalid value in Hz: {:?}", s));
    }
    Ok(val * multiplier)
}
