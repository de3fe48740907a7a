//! The acquisition, processing, pacing, render and control loop
//!
//! Every iteration runs the same fixed sequence on one thread:
//!
//! ```text
//! read stream → compute / merge → gate → maybe render → poll key → maybe retune
//! ```
//!
//! The stream read is the only blocking call. Everything the loop keeps
//! between iterations (parameters, peak-hold frame, next refresh time)
//! lives in [`Analyzer`] and is only touched here.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::control::{ControlEvent, KeySource, apply_command, interpret};
use crate::device::{SdrDevice, Session};
use crate::error::TuningError;
use crate::params::DisplayParameters;
use crate::render::Renderer;
use crate::scheduler::{FrameDecision, FrameScheduler};
use crate::source::{StreamSource, StreamStats};
use crate::spectrum::{LogPowerTransform, PeakHoldState, SpectrumProcessor};
use crate::tui::Screen;

/// Monotonic time source for frame pacing.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The system monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Stream settings fixed for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOptions {
    /// FFT size N; each read fetches N complex samples
    pub bins: usize,
    /// CS16 scale divisor
    pub scale: f32,
    /// Stream read timeout in microseconds
    pub timeout_us: i64,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            bins: crate::params::DEFAULT_BINS,
            scale: crate::params::DEFAULT_SCALE,
            timeout_us: crate::params::DEFAULT_TIMEOUT_US,
        }
    }
}

/// Whether the loop keeps going after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What one iteration did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
    /// Scheduler decision, `None` when the stream read was dropped
    pub decision: Option<FrameDecision>,
    /// A frame was drawn
    pub rendered: bool,
    /// Key handled in this iteration
    pub event: Option<ControlEvent>,
    pub flow: Flow,
}

/// Totals reported when the loop ends.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub frames_rendered: u64,
    pub stream: StreamStats,
    pub last_event: Option<ControlEvent>,
    pub params: DisplayParameters,
}

/// The spectrum analyzer session.
pub struct Analyzer<D, T, K, S, C = SystemClock>
where
    D: SdrDevice,
    T: LogPowerTransform,
    K: KeySource,
    S: Screen,
    C: Clock,
{
    session: Session<D>,
    source: StreamSource,
    processor: SpectrumProcessor<T>,
    scheduler: FrameScheduler,
    renderer: Renderer,
    keys: K,
    screen: S,
    clock: C,
    params: DisplayParameters,
    peak_hold: PeakHoldState,
    tuning_error: Option<TuningError>,
    running: bool,
    iterations: u64,
    frames_rendered: u64,
    last_event: Option<ControlEvent>,
}

impl<D, T, K, S> Analyzer<D, T, K, S, SystemClock>
where
    D: SdrDevice,
    T: LogPowerTransform,
    K: KeySource,
    S: Screen,
{
    pub fn new(
        device: D,
        transform: T,
        keys: K,
        screen: S,
        params: DisplayParameters,
        options: StreamOptions,
    ) -> Self {
        Self::with_clock(device, transform, keys, screen, params, options, SystemClock)
    }
}

impl<D, T, K, S, C> Analyzer<D, T, K, S, C>
where
    D: SdrDevice,
    T: LogPowerTransform,
    K: KeySource,
    S: Screen,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn with_clock(
        device: D,
        transform: T,
        keys: K,
        screen: S,
        params: DisplayParameters,
        options: StreamOptions,
        clock: C,
    ) -> Self {
        let scheduler = FrameScheduler::new(clock.now());
        Self {
            session: Session::new(device),
            source: StreamSource::new(options.bins, options.scale, options.timeout_us),
            processor: SpectrumProcessor::new(transform),
            scheduler,
            renderer: Renderer::new(),
            keys,
            screen,
            clock,
            params,
            peak_hold: PeakHoldState::new(),
            tuning_error: None,
            running: true,
            iterations: 0,
            frames_rendered: 0,
            last_event: None,
        }
    }

    pub fn params(&self) -> &DisplayParameters {
        &self.params
    }

    pub fn device(&self) -> &D {
        self.session.device()
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// Frame retained for the peak-hold merge.
    pub fn peak_hold(&self) -> &PeakHoldState {
        &self.peak_hold
    }

    pub fn stream_stats(&self) -> StreamStats {
        self.source.stats()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one iteration of the loop.
    pub fn step(&mut self) -> Iteration {
        self.iterations += 1;

        // A failed read is already counted and logged by the source.
        let samples = self.source.read(self.session.device_mut()).ok();

        let mut decision = None;
        let mut rendered = false;
        if let Some(samples) = samples {
            let now = self.clock.now();
            let gate = self.scheduler.decide(now, self.params.peak_hold);
            decision = Some(gate);

            if gate.computes() {
                let prior = std::mem::take(&mut self.peak_hold);
                let (frame, next) = self
                    .processor
                    .process(&samples, self.params.peak_hold, prior);
                self.peak_hold = next;

                if gate.renders() {
                    rendered = self.draw(&frame);
                    self.scheduler.rendered(now, self.params.frame_interval());
                }
            }
        }

        let event = self.poll_key();
        if let Some(event) = event {
            self.handle(event);
        }

        Iteration {
            decision,
            rendered,
            event,
            flow: if self.running {
                Flow::Continue
            } else {
                Flow::Quit
            },
        }
    }

    /// Loop until the quit key, then tear the device down.
    pub fn run(mut self) -> RunSummary {
        info!(
            "Starting display loop: {} bins at {} Msps, {} MHz",
            self.source.bins(),
            self.params.sample_rate / 1e6,
            self.params.frequency / 1e6
        );
        while self.running {
            self.step();
        }
        self.finish()
    }

    /// Tear the device down and report totals.
    pub fn finish(mut self) -> RunSummary {
        if let Err(e) = self.session.shutdown() {
            warn!("Device teardown failed: {}", e);
        }
        let stream = self.source.stats();
        info!(
            "Display loop ended after {} iterations, {} frames, {} dropped reads",
            self.iterations,
            self.frames_rendered,
            stream.dropped()
        );
        RunSummary {
            iterations: self.iterations,
            frames_rendered: self.frames_rendered,
            stream,
            last_event: self.last_event,
            params: self.params.clone(),
        }
    }

    fn draw(&mut self, frame: &[f32]) -> bool {
        let (width, height) = match self.screen.size() {
            Ok(size) => size,
            Err(e) => {
                warn!("Cannot query terminal size: {}", e);
                return false;
            }
        };
        let notice = self.notice();
        let lines = self
            .renderer
            .render(frame, width, height, &self.params, notice.as_deref());
        match self.screen.draw(&lines) {
            Ok(()) => {
                self.frames_rendered += 1;
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn notice(&self) -> Option<String> {
        if let Some(err) = &self.tuning_error {
            return Some(err.to_string());
        }
        let stats = self.source.stats();
        if stats.dropped() > 0 {
            return Some(format!(
                "stream: {} dropped reads ({} timeouts, {} short, {} errors)",
                stats.dropped(),
                stats.timeouts,
                stats.short_reads,
                stats.failures
            ));
        }
        None
    }

    fn poll_key(&mut self) -> Option<ControlEvent> {
        match self.keys.poll_event() {
            Ok(event) => event,
            Err(e) => {
                warn!("Keyboard poll failed: {}", e);
                None
            }
        }
    }

    fn handle(&mut self, event: ControlEvent) {
        self.last_event = Some(event);
        let outcome = interpret(&self.params, event);
        self.params = outcome.params;

        if let Some(command) = outcome.command {
            match apply_command(self.session.device_mut(), &mut self.params, command) {
                Ok(()) => self.tuning_error = None,
                Err(e) => self.tuning_error = Some(e),
            }
        }

        if outcome.quit {
            debug!("Quit requested");
            self.running = false;
        }
    }
}
