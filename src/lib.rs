#![doc = include_str!("../readme.md")]

pub mod analyzer;
pub mod cli;
pub mod control;
pub mod device;
pub mod error;
pub mod iqfile;
pub mod logging;
pub mod params;
pub mod render;
pub mod scheduler;
#[cfg(feature = "soapy")]
pub mod soapy;
pub mod source;
pub mod spectrum;
pub mod tui;

pub use analyzer::{Analyzer, Clock, RunSummary, StreamOptions, SystemClock};
pub use control::{ArrowDirection, ControlEvent, ControlOutcome, DeviceCommand, KeySource};
pub use device::{SdrDevice, Session, StreamRead};
pub use error::{Error, Result, StreamReadError, TuningError, TuningTarget};
pub use params::DisplayParameters;
pub use spectrum::{FftLogPower, LogPowerTransform, PeakHoldState, SpectrumFrame};
