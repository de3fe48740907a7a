//! Stream acquisition
//!
//! [`StreamSource`] pulls one batch of `N` complex samples per call from an
//! [`SdrDevice`], rejecting timeouts and short reads instead of handing a
//! stale or partial buffer to the spectrum processor.

use num_complex::Complex;
use tracing::{debug, trace};

use crate::device::SdrDevice;
use crate::error::StreamReadError;

/// Counters for stream reads that did not produce a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Reads that delivered a full buffer
    pub reads: u64,
    /// Reads that timed out without data
    pub timeouts: u64,
    /// Reads that delivered fewer values than requested
    pub short_reads: u64,
    /// Reads that failed at the driver level
    pub failures: u64,
}

impl StreamStats {
    /// Total number of dropped iterations.
    pub fn dropped(&self) -> u64 {
        self.timeouts + self.short_reads + self.failures
    }

    fn record(&mut self, err: &StreamReadError) {
        match err {
            StreamReadError::Timeout { .. } => self.timeouts += 1,
            StreamReadError::ShortRead { .. } => self.short_reads += 1,
            StreamReadError::Driver(_) => self.failures += 1,
        }
    }
}

/// Converts interleaved CS16 values to normalized complex samples.
///
/// The divisor is device dependent (about 3000 for rtlsdr, 2048 for pluto)
/// and is not calibrated automatically.
pub fn convert_cs16_to_complex(buffer: &[i16], scale: f32) -> Vec<Complex<f32>> {
    buffer
        .chunks_exact(2)
        .map(|c| Complex::new(c[0] as f32 / scale, c[1] as f32 / scale))
        .collect()
}

/// Blocking, bounded-timeout reader of fixed size sample batches.
pub struct StreamSource {
    bins: usize,
    scale: f32,
    timeout_us: i64,
    raw: Vec<i16>,
    stats: StreamStats,
}

impl StreamSource {
    /// Create a source delivering `bins` complex samples per read.
    pub fn new(bins: usize, scale: f32, timeout_us: i64) -> Self {
        Self {
            bins,
            scale,
            timeout_us,
            raw: vec![0; bins * 2],
            stats: StreamStats::default(),
        }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Read exactly `bins` complex samples from `device`.
    ///
    /// Requests `2 * bins` interleaved I/Q values. Anything less than a full
    /// buffer is reported as an error and counted; the returned buffer is
    /// always exactly `bins` long.
    pub fn read<D: SdrDevice + ?Sized>(
        &mut self,
        device: &mut D,
    ) -> Result<Vec<Complex<f32>>, StreamReadError> {
        let requested = self.raw.len();
        let result = device
            .read_stream(&mut self.raw, self.timeout_us)
            .and_then(|read| {
                if read.values_read == 0 {
                    Err(StreamReadError::Timeout {
                        timeout_us: self.timeout_us,
                    })
                } else if read.values_read < requested {
                    Err(StreamReadError::ShortRead {
                        read: read.values_read,
                        requested,
                    })
                } else {
                    trace!(
                        flags = read.flags,
                        timestamp_ns = read.timestamp_ns,
                        "stream read complete"
                    );
                    Ok(read)
                }
            });

        match result {
            Ok(_) => {
                self.stats.reads += 1;
                Ok(convert_cs16_to_complex(&self.raw, self.scale))
            }
            Err(e) => {
                self.stats.record(&e);
                debug!("Dropping iteration: {}", e);
                Err(e)
            }
        }
    }
}
