//! Receiver hardware abstraction
//!
//! The display loop talks to the radio only through [`SdrDevice`]. Backends
//! (SoapySDR, IQ file replay, test doubles) implement it; the loop never
//! knows which one it drives.

use crate::error::{Result, StreamReadError};

/// Outcome of one blocking stream read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRead {
    /// Number of interleaved 16-bit values written to the buffer
    pub values_read: usize,
    /// Driver flags attached to the buffer
    pub flags: i32,
    /// Hardware timestamp of the first sample, in nanoseconds
    pub timestamp_ns: i64,
}

/// A receiving device with an active CS16 RX stream.
///
/// Configuration calls are synchronous: they return once the device has
/// acknowledged or rejected the new value.
pub trait SdrDevice {
    /// Retune the RX center frequency (Hz).
    fn set_frequency(&mut self, frequency: f64) -> Result<()>;

    /// Change the RX sample rate (samples per second).
    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()>;

    /// Block until `buffer` is filled with interleaved I/Q values or the
    /// timeout expires, whichever comes first.
    fn read_stream(
        &mut self,
        buffer: &mut [i16],
        timeout_us: i64,
    ) -> std::result::Result<StreamRead, StreamReadError>;

    /// Stop streaming.
    fn deactivate_stream(&mut self) -> Result<()>;

    /// Close the RX stream.
    fn close_stream(&mut self) -> Result<()>;

    /// Release the device handle.
    fn release(&mut self) -> Result<()>;
}

/// Owns a device for the length of a session and tears it down exactly once.
///
/// Teardown runs the three shutdown steps in order (deactivate, close,
/// release) either explicitly through [`Session::shutdown`] or on drop.
pub struct Session<D: SdrDevice> {
    device: D,
    closed: bool,
}

impl<D: SdrDevice> Session<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            closed: false,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Tear the stream and device down. Later calls are no-ops.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Run every step even if an earlier one fails; report the first error.
        let deactivate = self.device.deactivate_stream();
        let close = self.device.close_stream();
        let release = self.device.release();
        deactivate.and(close).and(release)
    }
}

impl<D: SdrDevice> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!("Device teardown failed: {}", e);
        }
    }
}
