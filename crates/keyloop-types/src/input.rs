//! Key events delivered by a raw input source.
//!
//! Input backends map their native keystrokes to [`Key`]. Printable and
//! control characters arrive as [`Key::Char`]; keys that have no character
//! (arrows, function keys) arrive as [`Key::Special`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ctrl-C as delivered by a raw terminal.
pub const CTRL_C: char = '\x03';
/// Ctrl-D as delivered by a raw terminal.
pub const CTRL_D: char = '\x04';

/// Keys without a character representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    BackTab,
    /// Function key F1..F24.
    F(u8),
}

/// One keystroke read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Special(SpecialKey),
}

impl Key {
    /// The character, if this key has one.
    pub fn as_char(self) -> Option<char> {
        match self {
            Self::Char(c) => Some(c),
            Self::Special(_) => None,
        }
    }

    /// Ctrl-C and Ctrl-D always end the input loop.
    pub fn is_hard_break(self) -> bool {
        matches!(self, Self::Char(CTRL_C | CTRL_D))
    }

    /// Whether a miss on this key is worth recording as a wish.
    ///
    /// Whitespace, control characters and special keys are never recorded
    /// since they cannot be bound as hotkeys in a useful way.
    pub fn is_wishable(self) -> bool {
        match self {
            Self::Char(c) => !c.is_whitespace() && !c.is_control(),
            Self::Special(_) => false,
        }
    }

    /// Echo shown for a key that matched nothing: its repr and code point.
    pub fn describe(self) -> String {
        match self {
            Self::Char(c) => format!("{c:?} {}", c as u32),
            Self::Special(_) => format!("<{}>", key_name(self)),
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<SpecialKey> for Key {
    fn from(k: SpecialKey) -> Self {
        Self::Special(k)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&key_name(*self))
    }
}

/// Human-readable name for a key, used in shortcut listings and key history.
pub fn key_name(key: Key) -> String {
    match key {
        Key::Char(c) => char_name(c),
        Key::Special(special) => match special {
            SpecialKey::Up => "up".to_string(),
            SpecialKey::Down => "down".to_string(),
            SpecialKey::Left => "left".to_string(),
            SpecialKey::Right => "right".to_string(),
            SpecialKey::Home => "home".to_string(),
            SpecialKey::End => "end".to_string(),
            SpecialKey::PageUp => "pageup".to_string(),
            SpecialKey::PageDown => "pagedown".to_string(),
            SpecialKey::Insert => "insert".to_string(),
            SpecialKey::Delete => "delete".to_string(),
            SpecialKey::BackTab => "shift+tab".to_string(),
            SpecialKey::F(n) => format!("f{n}"),
        },
    }
}

fn char_name(c: char) -> String {
    match c {
        ' ' => "space".to_string(),
        '\t' => "tab".to_string(),
        '\r' | '\n' => "enter".to_string(),
        '\x1b' => "esc".to_string(),
        '\x7f' | '\x08' => "backspace".to_string(),
        '\0' => "ctrl+space".to_string(),
        '\x01'..='\x1a' => format!("ctrl+{}", (b'a' + c as u8 - 1) as char),
        c if c.is_control() => format!("{c:?}"),
        c => c.to_string(),
    }
}
