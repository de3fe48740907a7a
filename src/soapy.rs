//! SoapySDR receiver backend
//! (requires the `soapy` feature)
//!
//! Opens an enumerated SoapySDR device, configures rate and frequency, and
//! streams CS16 samples from RX channel 0. Startup progress is printed to
//! stdout before the display takes over the terminal.

use num_complex::Complex;
use soapysdr::{Args, Device, Direction, ErrorCode, RxStream};
use tracing::debug;

use crate::device::{SdrDevice, StreamRead};
use crate::error::{Error, Result, StreamReadError};

const CHANNEL: usize = 0;

/// Time given to the tuner to settle after the initial configuration
const SETTLE_TIME: std::time::Duration = std::time::Duration::from_secs(1);

/**
 * SoapySDR device selection and initial tuning
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SoapyConfig {
    /// Enumeration filter (e.g., "driver=rtlsdr"), empty for all devices
    pub args: String,
    /// Index into the enumerated device list
    pub index: usize,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Center frequency in Hz
    pub center_freq: f64,
}

/// List the devices matching `args`, in enumeration order.
pub fn enumerate_devices(args: &str) -> Result<Vec<Args>> {
    Ok(soapysdr::enumerate(args)?)
}

fn device_found(index: usize, args: &Args) -> String {
    format!("Device found: [{}] {}", index, describe(args))
}

fn describe(args: &Args) -> String {
    args.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/**
 * SoapySDR receiver with an active CS16 RX stream
 */
pub struct SoapyDevice {
    device: Option<Device>,
    stream: Option<RxStream<Complex<i16>>>,
    scratch: Vec<Complex<i16>>,
}

impl SoapyDevice {
    pub fn open(config: &SoapyConfig) -> Result<Self> {
        let found = enumerate_devices(&config.args)?;
        for (i, args) in found.iter().enumerate() {
            println!("{}", device_found(i, args));
        }

        let args = found.into_iter().nth(config.index).ok_or_else(|| {
            Error::device(format!("no SoapySDR device at index {}", config.index))
        })?;
        println!();
        println!("Creating the SoapySDR instance from device: [{}]...", config.index);
        println!();
        let device = Device::new(args)
            .map_err(|e| Error::device(format!("SoapySDRDevice_make fail: {}", e)))?;

        println!("Setting RX Rate: {} Msps...", config.sample_rate / 1e6);
        device
            .set_sample_rate(Direction::Rx, CHANNEL, config.sample_rate)
            .map_err(|e| Error::device(format!("setSampleRate fail: {}", e)))?;

        println!("Setting RX Freq: {} MHz...", config.center_freq / 1e6);
        device
            .set_frequency(Direction::Rx, CHANNEL, config.center_freq, ())
            .map_err(|e| Error::device(format!("setFrequency fail: {}", e)))?;

        std::thread::sleep(SETTLE_TIME);

        let mut stream = device
            .rx_stream::<Complex<i16>>(&[CHANNEL])
            .map_err(|e| Error::device(format!("setupStream fail: {}", e)))?;
        stream
            .activate(None)
            .map_err(|e| Error::device(format!("activateStream failed: {}", e)))?;

        Ok(Self {
            device: Some(device),
            stream: Some(stream),
            scratch: Vec::new(),
        })
    }

    fn device(&self) -> Result<&Device> {
        self.device
            .as_ref()
            .ok_or_else(|| Error::device("device released"))
    }
}

impl SdrDevice for SoapyDevice {
    fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        self.device()?
            .set_frequency(Direction::Rx, CHANNEL, frequency, ())?;
        Ok(())
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        self.device()?
            .set_sample_rate(Direction::Rx, CHANNEL, sample_rate)?;
        Ok(())
    }

    fn read_stream(
        &mut self,
        buffer: &mut [i16],
        timeout_us: i64,
    ) -> std::result::Result<StreamRead, StreamReadError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| StreamReadError::Driver("stream closed".into()))?;

        self.scratch.resize(buffer.len() / 2, Complex::new(0, 0));
        let len = match stream.read(&mut [&mut self.scratch[..]], timeout_us) {
            Ok(len) => len,
            Err(e) if e.code == ErrorCode::Timeout => {
                return Err(StreamReadError::Timeout { timeout_us });
            }
            Err(e) => return Err(StreamReadError::Driver(e.to_string())),
        };

        for (pair, sample) in buffer.chunks_exact_mut(2).zip(&self.scratch[..len]) {
            pair[0] = sample.re;
            pair[1] = sample.im;
        }

        Ok(StreamRead {
            values_read: len * 2,
            flags: 0,
            timestamp_ns: 0,
        })
    }

    fn deactivate_stream(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.deactivate(None)?;
            debug!("RX stream deactivated");
        }
        Ok(())
    }

    fn close_stream(&mut self) -> Result<()> {
        // Dropping the stream closes it.
        self.stream = None;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.device = None;
        Ok(())
    }
}
