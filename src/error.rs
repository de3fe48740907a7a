//! Error handling for retrogram
//!
//! Startup failures (bad arguments, device open, stream setup) are fatal and
//! abort before the display loop starts. Everything raised inside the loop
//! (stream reads, live retuning, rendering) is recoverable: the iteration is
//! dropped or the parameter is kept at its last committed value.

use thiserror::Error;

/// A specialized Result type for retrogram operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for retrogram operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid startup arguments
    #[error("Configuration error: {0}")]
    Config(String),

    /// Device open, configure or stream setup failure
    #[error("Device error: {0}")]
    Device(String),

    /// Stream read failed, timed out or came back short
    #[error("Stream read error: {0}")]
    StreamRead(#[from] StreamReadError),

    /// Live frequency or sample rate change rejected by the device
    #[error("Tuning error: {0}")]
    Tuning(#[from] TuningError),

    /// Terminal backend failure while drawing
    #[error("Render error: {0}")]
    Render(String),

    /// I/O error (files, terminal)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SoapySDR specific error (requires "soapy" feature)
    #[cfg(feature = "soapy")]
    #[error("SoapySDR error: {0}")]
    SoapySdr(#[from] soapysdr::Error),
}

/// Reasons a single stream read did not yield a full buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamReadError {
    /// No samples arrived before the read timeout.
    #[error("timeout after {timeout_us} us")]
    Timeout { timeout_us: i64 },

    /// Fewer values than requested were delivered.
    #[error("short read: {read} of {requested} values")]
    ShortRead { read: usize, requested: usize },

    /// Device level failure reported by the driver.
    #[error("{0}")]
    Driver(String),
}

/// Hardware parameter that can be retuned while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningTarget {
    Frequency,
    SampleRate,
}

impl std::fmt::Display for TuningTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuningTarget::Frequency => write!(f, "setFrequency"),
            TuningTarget::SampleRate => write!(f, "setSampleRate"),
        }
    }
}

/// A live retune the device refused. The committed value is unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{target} {requested} failed: {reason}")]
pub struct TuningError {
    pub target: TuningTarget,
    pub requested: f64,
    pub reason: String,
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a device error with a custom message
    pub fn device<S: Into<String>>(msg: S) -> Self {
        Error::Device(msg.into())
    }

    /// Create a render error with a custom message
    pub fn render<S: Into<String>>(msg: S) -> Self {
        Error::Render(msg.into())
    }
}
