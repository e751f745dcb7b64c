//! Keyboard input from the controlling terminal.
//!
//! Keys are read in raw mode so a single press reaches the shell without
//! Enter. Lines after `:` and `-` come through the same event reader, with
//! local echo and backspace, so nothing typed ahead is lost between modes.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use keyloop_terminal::InputSource;
use keyloop_types::error::Result;
use keyloop_types::input::{Key, SpecialKey};

/// Raw mode for as long as the guard lives.
struct RawMode;

impl RawMode {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            log::warn!("failed to leave raw mode: {e}");
        }
    }
}

/// Translate a crossterm key press into a shell key.
///
/// Ctrl+letter becomes the matching control character, so Ctrl-C and
/// Ctrl-D arrive as the shell's break keys.
pub fn map_key(key: KeyEvent) -> Option<Key> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let mapped = match key.code {
        KeyCode::Char(' ') if ctrl => Key::Char('\0'),
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => {
            Key::Char(char::from(c.to_ascii_lowercase() as u8 - b'a' + 1))
        },
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Char('\r'),
        KeyCode::Tab => Key::Char('\t'),
        KeyCode::Backspace => Key::Char('\x7f'),
        KeyCode::Esc => Key::Char('\x1b'),
        KeyCode::Up => Key::Special(SpecialKey::Up),
        KeyCode::Down => Key::Special(SpecialKey::Down),
        KeyCode::Left => Key::Special(SpecialKey::Left),
        KeyCode::Right => Key::Special(SpecialKey::Right),
        KeyCode::Home => Key::Special(SpecialKey::Home),
        KeyCode::End => Key::Special(SpecialKey::End),
        KeyCode::PageUp => Key::Special(SpecialKey::PageUp),
        KeyCode::PageDown => Key::Special(SpecialKey::PageDown),
        KeyCode::Insert => Key::Special(SpecialKey::Insert),
        KeyCode::Delete => Key::Special(SpecialKey::Delete),
        KeyCode::BackTab => Key::Special(SpecialKey::BackTab),
        KeyCode::F(n) => Key::Special(SpecialKey::F(n)),
        _ => return None,
    };
    Some(mapped)
}

/// What one key press does to a line being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEdit {
    Insert(char),
    Erase,
    Submit,
    /// Esc, Ctrl-C or Ctrl-D drop the line.
    Abort,
    Ignore,
}

pub fn line_edit(key: KeyEvent) -> LineEdit {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => LineEdit::Submit,
        KeyCode::Esc => LineEdit::Abort,
        KeyCode::Backspace => LineEdit::Erase,
        KeyCode::Char('c' | 'd' | 'C' | 'D') if ctrl => LineEdit::Abort,
        KeyCode::Char(c) if !ctrl => LineEdit::Insert(c),
        KeyCode::Tab => LineEdit::Insert('\t'),
        _ => LineEdit::Ignore,
    }
}

/// [`InputSource`] over the process's terminal.
#[derive(Debug, Default)]
pub struct TerminalInput;

impl TerminalInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for TerminalInput {
    fn read_key(&mut self) -> Result<Option<Key>> {
        let _raw = RawMode::enter()?;
        loop {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && let Some(mapped) = map_key(key)
            {
                return Ok(Some(mapped));
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let _raw = RawMode::enter()?;
        let mut line = String::new();
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match line_edit(key) {
                LineEdit::Insert(c) => {
                    line.push(c);
                    write!(stdout, "{c}")?;
                },
                LineEdit::Erase => {
                    if line.pop().is_some() {
                        write!(stdout, "\x08 \x08")?;
                    }
                },
                LineEdit::Submit => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(Some(line));
                },
                LineEdit::Abort => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(None);
                },
                LineEdit::Ignore => {},
            }
            stdout.flush()?;
        }
    }
}
