//! Frame pacing
//!
//! Decides once per loop iteration whether a spectrum has to be computed and
//! whether it may be drawn, from the time of the next allowed refresh.

use std::time::{Duration, Instant};

/// What the current iteration should do with the samples it just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// Nothing to compute and nothing to draw.
    Skip,
    /// Compute and merge the frame, but do not draw it yet.
    Compute,
    /// Compute the frame and draw it.
    Render,
}

impl FrameDecision {
    pub fn computes(self) -> bool {
        !matches!(self, FrameDecision::Skip)
    }

    pub fn renders(self) -> bool {
        matches!(self, FrameDecision::Render)
    }
}

/// Tracks the next instant at which the display may be refreshed.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    next_refresh: Instant,
}

impl FrameScheduler {
    /// A scheduler whose first refresh is due immediately.
    pub fn new(now: Instant) -> Self {
        Self { next_refresh: now }
    }

    pub fn next_refresh(&self) -> Instant {
        self.next_refresh
    }

    /// Gate one iteration.
    ///
    /// Without peak-hold, frames that cannot be shown are not computed at
    /// all. With peak-hold every frame is computed so no peak is lost, and
    /// only the draw is rate limited.
    pub fn decide(&self, now: Instant, peak_hold: bool) -> FrameDecision {
        let due = now >= self.next_refresh;
        match (due, peak_hold) {
            (true, _) => FrameDecision::Render,
            (false, true) => FrameDecision::Compute,
            (false, false) => FrameDecision::Skip,
        }
    }

    /// Record a render at `now`; the next one is due `interval` later.
    pub fn rendered(&mut self, now: Instant, interval: Duration) {
        self.next_refresh = now + interval;
    }
}
