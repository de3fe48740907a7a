//! Test doubles for driving the display loop without hardware or a terminal
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use num_complex::Complex;
use retrogram::analyzer::Clock;
use retrogram::control::{ControlEvent, KeySource};
use retrogram::device::{SdrDevice, StreamRead};
use retrogram::error::{Error, Result, StreamReadError};
use retrogram::spectrum::{LogPowerTransform, SpectrumFrame};
use retrogram::tui::Screen;

/// Device call as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetFrequency(f64),
    SetSampleRate(f64),
    Read,
    Deactivate,
    Close,
    Release,
}

/// Scripted outcome of one stream read
#[derive(Debug, Clone, Copy)]
pub enum ReadOutcome {
    Full,
    Short(usize),
    Timeout,
}

/// Device recording every call into a shared log
pub struct MockDevice {
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub reads: VecDeque<ReadOutcome>,
    pub reject_frequency: bool,
    pub reject_sample_rate: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            reads: VecDeque::new(),
            reject_frequency: false,
            reject_sample_rate: false,
        }
    }

    pub fn with_reads(mut self, reads: &[ReadOutcome]) -> Self {
        self.reads = reads.iter().copied().collect();
        self
    }

    /// Handle on the call log that survives the device.
    pub fn log(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.calls)
    }
}

impl SdrDevice for MockDevice {
    fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        self.calls.borrow_mut().push(Call::SetFrequency(frequency));
        if self.reject_frequency {
            return Err(Error::device("tuner refused"));
        }
        Ok(())
    }

    fn set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        self.calls.borrow_mut().push(Call::SetSampleRate(sample_rate));
        if self.reject_sample_rate {
            return Err(Error::device("rate unsupported"));
        }
        Ok(())
    }

    fn read_stream(
        &mut self,
        buffer: &mut [i16],
        timeout_us: i64,
    ) -> std::result::Result<StreamRead, StreamReadError> {
        self.calls.borrow_mut().push(Call::Read);
        buffer.fill(0);
        let values_read = match self.reads.pop_front().unwrap_or(ReadOutcome::Full) {
            ReadOutcome::Full => buffer.len(),
            ReadOutcome::Short(n) => n.min(buffer.len()),
            ReadOutcome::Timeout => return Err(StreamReadError::Timeout { timeout_us }),
        };
        Ok(StreamRead {
            values_read,
            flags: 0,
            timestamp_ns: 0,
        })
    }

    fn deactivate_stream(&mut self) -> Result<()> {
        self.calls.borrow_mut().push(Call::Deactivate);
        Ok(())
    }

    fn close_stream(&mut self) -> Result<()> {
        self.calls.borrow_mut().push(Call::Close);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.calls.borrow_mut().push(Call::Release);
        Ok(())
    }
}

/// Count `call` in a log
pub fn count(calls: &[Call], call: &Call) -> usize {
    calls.iter().filter(|c| *c == call).count()
}

/// Device calls other than stream reads
pub fn control_calls(calls: &[Call]) -> Vec<Call> {
    calls.iter().filter(|c| **c != Call::Read).cloned().collect()
}

/// Transform returning queued frames, then repeating the last one
pub struct ScriptedTransform {
    frames: VecDeque<SpectrumFrame>,
    last: SpectrumFrame,
    pub calls: Rc<Cell<usize>>,
}

impl ScriptedTransform {
    pub fn new(frames: &[&[f32]]) -> Self {
        let frames: VecDeque<SpectrumFrame> = frames.iter().map(|f| f.to_vec()).collect();
        let last = frames.back().cloned().unwrap_or_else(|| vec![-100.0; 4]);
        Self {
            frames,
            last,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl LogPowerTransform for ScriptedTransform {
    fn log_power(&mut self, _samples: &[Complex<f32>]) -> SpectrumFrame {
        self.calls.set(self.calls.get() + 1);
        if let Some(frame) = self.frames.pop_front() {
            self.last = frame.clone();
            frame
        } else {
            self.last.clone()
        }
    }
}

/// Keyboard replaying one scripted entry per poll, then reporting nothing
pub struct ScriptedKeys {
    script: VecDeque<Option<ControlEvent>>,
    pub polls: Rc<Cell<usize>>,
}

impl ScriptedKeys {
    pub fn new(script: &[Option<ControlEvent>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            polls: Rc::new(Cell::new(0)),
        }
    }

    pub fn none() -> Self {
        Self::new(&[])
    }

    /// One key per poll.
    pub fn keys(keys: &str) -> Self {
        let script: Vec<_> = keys.chars().map(|c| Some(ControlEvent::Key(c))).collect();
        Self::new(&script)
    }
}

impl KeySource for ScriptedKeys {
    fn poll_event(&mut self) -> Result<Option<ControlEvent>> {
        self.polls.set(self.polls.get() + 1);
        Ok(self.script.pop_front().flatten())
    }
}

/// Screen keeping every drawn frame
pub struct RecordingScreen {
    pub width: usize,
    pub height: usize,
    pub frames: Rc<RefCell<Vec<Vec<String>>>>,
}

impl RecordingScreen {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            frames: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Screen for RecordingScreen {
    fn size(&self) -> Result<(usize, usize)> {
        Ok((self.width, self.height))
    }

    fn draw(&mut self, lines: &[String]) -> Result<()> {
        self.frames.borrow_mut().push(lines.to_vec());
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
