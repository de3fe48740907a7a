//! Tracing subscriber setup
//!
//! Logs go to stderr unless a log file is given. The terminal display and
//! stderr share the same screen, so console output is routed through a
//! [`ConsoleGate`] that the binary mutes while the display is active.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::error::{Error, Result};

/// Map the `-v` count to a maximum level.
///
/// 0 = WARN (quiet), 1 = INFO, 2 = DEBUG, 3+ = TRACE
pub fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Stderr writer that can be silenced.
#[derive(Debug, Clone, Default)]
pub struct ConsoleGate {
    muted: Arc<AtomicBool>,
}

impl ConsoleGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mute(&self) {
        self.muted.store(true, Ordering::Relaxed);
    }

    pub fn unmute(&self) {
        self.muted.store(false, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }
}

impl<'a> MakeWriter<'a> for ConsoleGate {
    type Writer = Box<dyn Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        if self.is_muted() {
            Box::new(io::sink())
        } else {
            Box::new(io::stderr())
        }
    }
}

/// Install the global subscriber.
///
/// Returns the gate for console output; it has no effect when logging to a
/// file. A subscriber installed earlier (e.g. by a test harness) is kept.
pub fn init(verbose: u8, log_file: Option<&Path>) -> Result<ConsoleGate> {
    let level = level_for(verbose);
    let gate = ConsoleGate::new();

    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                Error::config(format!("cannot create log file {}: {}", path.display(), e))
            })?;
            let _ = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(gate.clone())
                .try_init();
        }
    }

    Ok(gate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(3), Level::TRACE);
        assert_eq!(level_for(9), Level::TRACE);
    }

    #[test]
    fn test_gate_is_shared_between_clones() {
        let gate = ConsoleGate::new();
        let writer_side = gate.clone();
        assert!(!writer_side.is_muted());
        gate.mute();
        assert!(writer_side.is_muted());
        gate.unmute();
        assert!(!writer_side.is_muted());
    }

    #[test]
    fn test_muted_gate_swallows_output() {
        let gate = ConsoleGate::new();
        gate.mute();
        let mut writer = gate.make_writer();
        assert_eq!(writer.write(b"hidden").unwrap(), 6);
    }

    #[test]
    fn test_unwritable_log_file_is_config_error() {
        let result = init(0, Some(Path::new("/nonexistent/dir/retrogram.log")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
