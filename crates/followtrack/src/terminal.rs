//! Terminal capability used by the interactive screens
//!
//! Screens only need to know the window size, paint a frame of lines, read a
//! single keypress and hand a URL to the system browser. [`RawTerminal`] does
//! this with crossterm; tests drive the same screens with a scripted terminal.

use crate::error::{self, Error};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self as term, Clear, ClearType};
use crossterm::{execute, queue};
use followtrack_core::selection::Key;
use std::io::{stdout, Write};
use std::process::{Command, Stdio};

pub trait Terminal {
    /// `(columns, rows)`
    fn size(&self) -> (usize, usize);

    /// Replace the screen contents with `lines`.
    fn draw(&mut self, lines: &[String]) -> error::Result<()>;

    /// Block until one key is pressed.
    fn read_key(&mut self) -> error::Result<Key>;

    fn open_url(&mut self, url: &str) -> error::Result<()>;
}

fn terminal_error(e: std::io::Error) -> Error {
    Error::Terminal(e.to_string())
}

/// The real terminal. Raw mode is held only while waiting for a key.
pub struct RawTerminal {
    _private: (),
}

impl RawTerminal {
    pub fn new() -> error::Result<Self> {
        execute!(stdout(), Hide).map_err(terminal_error)?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = term::disable_raw_mode();
        let _ = execute!(stdout(), Show);
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Key {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Key::Char('q'),
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Esc => Key::Char('q'),
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}

impl Terminal for RawTerminal {
    fn size(&self) -> (usize, usize) {
        match terminal_size::terminal_size() {
            Some((terminal_size::Width(w), terminal_size::Height(h))) => {
                (w as usize, h as usize)
            }
            None => (80, 24),
        }
    }

    fn draw(&mut self, lines: &[String]) -> error::Result<()> {
        let mut out = stdout();
        queue!(out, Clear(ClearType::All), MoveTo(0, 0)).map_err(terminal_error)?;
        for (row, line) in lines.iter().enumerate() {
            queue!(out, MoveTo(0, row as u16), Print(line)).map_err(terminal_error)?;
        }
        out.flush().map_err(terminal_error)
    }

    fn read_key(&mut self) -> error::Result<Key> {
        term::enable_raw_mode().map_err(terminal_error)?;
        let key = loop {
            match event::read() {
                Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => {
                    break Ok(map_key(k.code, k.modifiers))
                }
                Ok(_) => continue,
                Err(e) => break Err(terminal_error(e)),
            }
        };
        term::disable_raw_mode().map_err(terminal_error)?;
        key
    }

    fn open_url(&mut self, url: &str) -> error::Result<()> {
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };

        Command::new(opener)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| Error::Terminal(format!("Failed to run {opener}: {e}")))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        assert_eq!(map_key(KeyCode::Up, KeyModifiers::NONE), Key::Up);
        assert_eq!(map_key(KeyCode::Char('j'), KeyModifiers::NONE), Key::Char('j'));
        assert_eq!(map_key(KeyCode::Char('c'), KeyModifiers::CONTROL), Key::Char('q'));
        assert_eq!(map_key(KeyCode::Esc, KeyModifiers::NONE), Key::Char('q'));
        assert_eq!(map_key(KeyCode::Tab, KeyModifiers::NONE), Key::Other);
    }
}
