//! Terminal backend
//!
//! [`TerminalScreen`] owns the terminal while the analyzer runs (raw mode,
//! alternate screen, hidden cursor) and restores it on drop.
//! [`TerminalKeys`] polls crossterm key events without waiting.

use std::io::{Stdout, Write, stdout};
use std::time::Duration;

use crossterm::{
    QueueableCommand, cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::control::{ArrowDirection, ControlEvent, KeySource};
use crate::error::{Error, Result};

/// Destination for rendered lines.
pub trait Screen {
    /// Current size as (columns, rows).
    fn size(&self) -> Result<(usize, usize)>;

    /// Replace the screen contents with `lines`.
    fn draw(&mut self, lines: &[String]) -> Result<()>;
}

/// Full-screen crossterm terminal.
pub struct TerminalScreen {
    out: Stdout,
}

impl TerminalScreen {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = stdout();
        out.queue(EnterAlternateScreen)?
            .queue(cursor::Hide)?
            .queue(Clear(ClearType::All))?;
        out.flush()?;
        Ok(Self { out })
    }
}

impl Screen for TerminalScreen {
    fn size(&self) -> Result<(usize, usize)> {
        let (cols, rows) = terminal::size()?;
        Ok((cols as usize, rows as usize))
    }

    fn draw(&mut self, lines: &[String]) -> Result<()> {
        let draw = |out: &mut Stdout| -> std::io::Result<()> {
            out.queue(Clear(ClearType::All))?;
            for (row, line) in lines.iter().enumerate() {
                out.queue(cursor::MoveTo(0, row as u16))?
                    .queue(Print(line))?;
            }
            out.flush()
        };
        draw(&mut self.out).map_err(|e| Error::render(e.to_string()))
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = self
            .out
            .queue(cursor::Show)
            .and_then(|out| out.queue(LeaveAlternateScreen))
            .and_then(|out| out.flush());
        let _ = terminal::disable_raw_mode();
    }
}

/// Keyboard events from the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl TerminalKeys {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for TerminalKeys {
    fn poll_event(&mut self) -> Result<Option<ControlEvent>> {
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let resolved = match key.code {
                // Raw mode swallows SIGINT; treat Ctrl-C as the quit key.
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    ControlEvent::Key('q')
                }
                KeyCode::Char(c) => ControlEvent::Key(c),
                KeyCode::Up => ControlEvent::Arrow(ArrowDirection::Up),
                KeyCode::Down => ControlEvent::Arrow(ArrowDirection::Down),
                KeyCode::Left => ControlEvent::Arrow(ArrowDirection::Left),
                KeyCode::Right => ControlEvent::Arrow(ArrowDirection::Right),
                _ => continue,
            };
            return Ok(Some(resolved));
        }
        Ok(None)
    }
}
