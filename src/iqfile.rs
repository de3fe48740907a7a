//! I/Q recording playback
//!
//! [`IqFileDevice`] replays a CS16 recording (little-endian interleaved
//! I/Q pairs) as if it came from a live receiver. Reads are paced in real
//! time at the current sample rate and the file is rewound when it ends.
//! Retuning is accepted and only changes the labels and the pacing.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::device::{SdrDevice, StreamRead};
use crate::error::{Error, Result, StreamReadError};

/// Bytes per CS16 value
const BYTES_PER_VALUE: usize = 2;

/// File backed receiver.
pub struct IqFileDevice {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    bytes: Vec<u8>,
    sample_rate: f64,
    frequency: f64,
    next_deadline: Option<Instant>,
}

impl IqFileDevice {
    /// Open `path` (a leading `~` is expanded) and start streaming.
    pub fn open<P: AsRef<Path>>(path: P, sample_rate: f64, frequency: f64) -> Result<Self> {
        let path = expanduser(path.as_ref().to_path_buf());
        let file = File::open(&path)
            .map_err(|e| Error::device(format!("cannot open {}: {}", path.display(), e)))?;
        let len = file.metadata()?.len();
        if len < (2 * BYTES_PER_VALUE) as u64 {
            return Err(Error::device(format!(
                "{} holds no complete CS16 sample",
                path.display()
            )));
        }
        info!(
            "Replaying {} ({} samples) at {} Msps",
            path.display(),
            len / (2 * BYTES_PER_VALUE) as u64,
            sample_rate / 1e6
        );

        Ok(Self {
            path,
            reader: Some(BufReader::new(file)),
            bytes: Vec::new(),
            sample_rate,
            frequency,
            next_deadline: None,
        })
    }

    /// Fill `self.bytes` completely, rewinding at end of file.
    fn fill(&mut self) -> std::io::Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(std::io::Error::other("stream closed"));
        };
        let mut filled = 0;
        let mut rewound = false;
        while filled < self.bytes.len() {
            let n = reader.read(&mut self.bytes[filled..])?;
            if n == 0 {
                if rewound {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "recording is empty",
                    ));
                }
                debug!("End of {}, rewinding", self.path.display());
                reader.seek(SeekFrom::Start(0))?;
                // A trailing partial value is dropped with the rest of the pass.
                filled -= filled % BYTES_PER_VALUE;
                rewound = true;
                continue;
            }
            filled += n;
            rewound = false;
        }
        Ok(())
    }
}

impl SdrDevice for IqFileDevice {
    fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        self.frequency = frequency;
        Ok(())
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        if sample_rate <= 0.0 {
            return Err(Error::device(format!("invalid sample rate {}", sample_rate)));
        }
        self.sample_rate = sample_rate;
        Ok(())
    }

    fn read_stream(
        &mut self,
        buffer: &mut [i16],
        timeout_us: i64,
    ) -> std::result::Result<StreamRead, StreamReadError> {
        if self.reader.is_none() {
            return Err(StreamReadError::Driver("stream closed".into()));
        }

        // Pace the batch as if the samples were arriving from the air.
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        let timeout = Duration::from_micros(timeout_us.max(0) as u64);
        if deadline > now {
            let wait = deadline - now;
            if wait > timeout {
                std::thread::sleep(timeout);
                return Err(StreamReadError::Timeout { timeout_us });
            }
            std::thread::sleep(wait);
        }
        let batch = Duration::from_secs_f64((buffer.len() / 2) as f64 / self.sample_rate);
        // Restart the clock after a stall instead of bursting to catch up.
        self.next_deadline = Some(deadline.max(now) + batch);

        self.bytes.resize(buffer.len() * BYTES_PER_VALUE, 0);
        self.fill()
            .map_err(|e| StreamReadError::Driver(e.to_string()))?;
        for (value, pair) in buffer.iter_mut().zip(self.bytes.chunks_exact(BYTES_PER_VALUE)) {
            *value = i16::from_le_bytes([pair[0], pair[1]]);
        }

        Ok(StreamRead {
            values_read: buffer.len(),
            flags: 0,
            timestamp_ns: 0,
        })
    }

    fn deactivate_stream(&mut self) -> Result<()> {
        self.next_deadline = None;
        Ok(())
    }

    fn close_stream(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.reader = None;
        debug!(
            "Released {} (last tuned to {} MHz)",
            self.path.display(),
            self.frequency / 1e6
        );
        Ok(())
    }
}

fn expanduser(path: PathBuf) -> PathBuf {
    if let Some(stripped) = path.to_str().and_then(|p| p.strip_prefix("~"))
        && let Some(home_dir) = dirs::home_dir()
    {
        return home_dir.join(stripped.trim_start_matches('/'));
    }
    path
}
