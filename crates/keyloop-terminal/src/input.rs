//! Raw input boundary.
//!
//! The loop reads through [`InputSource`]: one key at a time while idle, a
//! whole line after `:` or `-`. Terminal backends live in the host; this
//! module only provides [`ScriptedInput`] for tests and scripted sessions.

use std::collections::VecDeque;
use std::io;

use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::{Key, SpecialKey};

/// Blocking source of keystrokes and lines.
pub trait InputSource {
    /// Next keystroke, or `None` once input is exhausted (EOF).
    ///
    /// An `Io` error of kind `Interrupted` ends the loop like a break key.
    fn read_key(&mut self) -> Result<Option<Key>>;

    /// Next line of text without its line terminator, shown after `prompt`.
    ///
    /// `None` means the user aborted the line.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scripted {
    Key(Key),
    Line(String),
    Abort,
    Interrupt,
}

/// An [`InputSource`] that replays a prepared sequence of events.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: VecDeque<Scripted>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one keystroke.
    pub fn key(mut self, c: char) -> Self {
        self.events.push_back(Scripted::Key(Key::Char(c)));
        self
    }

    /// Queue one keystroke per character of `keys`.
    pub fn keys(mut self, keys: &str) -> Self {
        self.events
            .extend(keys.chars().map(|c| Scripted::Key(Key::Char(c))));
        self
    }

    pub fn special(mut self, key: SpecialKey) -> Self {
        self.events.push_back(Scripted::Key(Key::Special(key)));
        self
    }

    /// Queue a line answer for the next `read_line`.
    pub fn line(mut self, text: &str) -> Self {
        self.events.push_back(Scripted::Line(text.to_string()));
        self
    }

    /// `:` followed by `line`.
    pub fn colon(self, line: &str) -> Self {
        self.key(':').line(line)
    }

    /// `-` followed by `text`.
    pub fn note(self, text: &str) -> Self {
        self.key('-').line(text)
    }

    /// Queue an aborted line read.
    pub fn abort(mut self) -> Self {
        self.events.push_back(Scripted::Abort);
        self
    }

    /// Queue an OS-level interrupt.
    pub fn interrupt(mut self) -> Self {
        self.events.push_back(Scripted::Interrupt);
        self
    }

    /// Events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn read_key(&mut self) -> Result<Option<Key>> {
        match self.events.pop_front() {
            None => Ok(None),
            Some(Scripted::Key(key)) => Ok(Some(key)),
            Some(Scripted::Interrupt) => Err(io::Error::from(io::ErrorKind::Interrupted).into()),
            Some(other) => Err(KeyloopError::InvalidArgument(format!(
                "scripted input expected a key, found {other:?}"
            ))),
        }
    }

    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        match self.events.pop_front() {
            None | Some(Scripted::Abort) | Some(Scripted::Interrupt) => Ok(None),
            Some(Scripted::Line(text)) => Ok(Some(text)),
            Some(Scripted::Key(key)) => Err(KeyloopError::InvalidArgument(format!(
                "scripted input expected a line, found key {key}"
            ))),
        }
    }
}
