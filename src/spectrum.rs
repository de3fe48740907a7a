//! Log-power spectrum computation and peak-hold merging
//!
//! The transform is behind the [`LogPowerTransform`] trait so the processor
//! can be driven by a scripted transform in tests. The default
//! implementation, [`FftLogPower`], is a Blackman-Harris windowed FFT with
//! the DC bin moved to the centre of the frame.
//!
//! Peak-hold state is an explicit value threaded through
//! [`SpectrumProcessor::process`]: the caller passes the previous state in
//! and keeps the one handed back.

use std::f32::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Decibel power values, one per frequency bin, lowest frequency first.
pub type SpectrumFrame = Vec<f32>;

/// Turns a block of complex samples into a log-power frame of the same length.
pub trait LogPowerTransform {
    fn log_power(&mut self, samples: &[Complex<f32>]) -> SpectrumFrame;
}

/// Windowed FFT log-power spectrum.
pub struct FftLogPower {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Constant dB offset: -20·log10(N) - 10·log10(Σw²/N) + 3
    offset_db: f32,
    scratch: Vec<Complex<f32>>,
}

impl FftLogPower {
    /// Plan a transform for `size` bins.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let window = blackman_harris(size);
        let win_pwr: f32 = window.iter().map(|w| w * w).sum();
        let n = size.max(1) as f32;
        let offset_db =
            -20.0 * n.log10() - 10.0 * (win_pwr / n).max(f32::MIN_POSITIVE).log10() + 3.0;

        Self {
            fft,
            window,
            offset_db,
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }
}

impl LogPowerTransform for FftLogPower {
    fn log_power(&mut self, samples: &[Complex<f32>]) -> SpectrumFrame {
        let n = self.window.len();
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let s = samples.get(i).copied().unwrap_or_default();
            *slot = s * self.window[i];
        }

        self.fft.process(&mut self.scratch);
        fftshift(&mut self.scratch);

        let mut frame = Vec::with_capacity(n);
        for c in &self.scratch {
            let magnitude = c.norm().max(1e-20);
            frame.push(20.0 * magnitude.log10() + self.offset_db);
        }
        frame
    }
}

/// Blackman-Harris window of length `size`.
fn blackman_harris(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    let m = (size - 1) as f32;
    (0..size)
        .map(|n| {
            let x = n as f32 / m;
            0.35875 - 0.48829 * (2.0 * PI * x).cos() + 0.14128 * (4.0 * PI * x).cos()
                - 0.01168 * (6.0 * PI * x).cos()
        })
        .collect()
}

/// Move the DC bin to the centre so indices run from -fs/2 to +fs/2.
fn fftshift(data: &mut [Complex<f32>]) {
    let half = data.len() / 2;
    data.rotate_left(half);
}

/// Frame retained between iterations for peak-hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakHoldState {
    frame: Option<SpectrumFrame>,
}

impl PeakHoldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The retained baseline, if any.
    pub fn frame(&self) -> Option<&[f32]> {
        self.frame.as_deref()
    }
}

/// Bin-wise maximum of `frame` and `prior`.
///
/// Returns `frame` unchanged when the lengths differ.
pub fn merge_peak_hold(mut frame: SpectrumFrame, prior: &[f32]) -> SpectrumFrame {
    if frame.len() == prior.len() {
        for (value, &held) in frame.iter_mut().zip(prior) {
            *value = value.max(held);
        }
    }
    frame
}

/// Computes frames and applies the peak-hold merge.
pub struct SpectrumProcessor<T: LogPowerTransform> {
    transform: T,
}

impl<T: LogPowerTransform> SpectrumProcessor<T> {
    pub fn new(transform: T) -> Self {
        Self { transform }
    }

    /// Compute the frame for `samples`.
    ///
    /// With peak-hold enabled and a retained frame of the same length, the
    /// result is the bin-wise maximum of both; otherwise it is the raw frame.
    /// Either way the result becomes the new retained baseline.
    pub fn process(
        &mut self,
        samples: &[Complex<f32>],
        peak_hold: bool,
        prior: PeakHoldState,
    ) -> (SpectrumFrame, PeakHoldState) {
        let raw = self.transform.log_power(samples);
        let frame = match prior.frame {
            Some(ref held) if peak_hold => merge_peak_hold(raw, held),
            _ => raw,
        };
        let next = PeakHoldState {
            frame: Some(frame.clone()),
        };
        (frame, next)
    }
}
