//! Single-key shortcuts.
//!
//! A hotkey runs as soon as its key is pressed, with no further input.
//! Bindings keep registration order so `:shortcuts` output is stable.

use std::collections::HashMap;
use std::fmt;

use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::{CTRL_C, CTRL_D, Key, key_name};

/// Keys the dispatcher claims before hotkeys are consulted.
pub const RESERVED_KEYS: &[char] = &[':', '-', '?', CTRL_C, CTRL_D];

/// A zero-argument action.
///
/// Any `Fn() -> Result<()>` closure is a hotkey; structs holding captured
/// state can implement it directly.
pub trait Hotkey {
    fn invoke(&self) -> Result<()>;
}

impl<F> Hotkey for F
where
    F: Fn() -> Result<()>,
{
    fn invoke(&self) -> Result<()> {
        self()
    }
}

/// What a hotkey runs.
pub enum HotkeyTarget {
    /// An arbitrary callable.
    Call(Box<dyn Hotkey>),
    /// A registered colon-command, run with no arguments and not logged.
    Command(String),
}

impl HotkeyTarget {
    pub fn call<F>(f: F) -> Self
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self::Call(Box::new(f))
    }

    pub fn command(name: impl Into<String>) -> Self {
        Self::Command(name.into())
    }
}

impl fmt::Debug for HotkeyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call(_) => f.write_str("Call(..)"),
            Self::Command(name) => f.debug_tuple("Command").field(name).finish(),
        }
    }
}

/// One registered hotkey.
#[derive(Debug)]
pub struct HotkeyBinding {
    key: char,
    target: HotkeyTarget,
    help: String,
}

impl HotkeyBinding {
    pub fn key(&self) -> char {
        self.key
    }

    pub fn target(&self) -> &HotkeyTarget {
        &self.target
    }

    pub fn help(&self) -> &str {
        &self.help
    }
}

fn validate(key: char, target: &HotkeyTarget) -> Result<()> {
    if RESERVED_KEYS.contains(&key) {
        return Err(KeyloopError::Config(format!(
            "hotkey {} is reserved by the shell",
            key_name(Key::Char(key))
        )));
    }
    if let HotkeyTarget::Command(name) = target
        && name.is_empty()
    {
        return Err(KeyloopError::Config(format!(
            "hotkey {} targets an empty command name",
            key_name(Key::Char(key))
        )));
    }
    Ok(())
}

/// Ordered key → action table.
#[derive(Debug, Default)]
pub struct HotkeyRegistry {
    bindings: Vec<HotkeyBinding>,
}

impl HotkeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key`, silently replacing any previous binding in place.
    pub fn register(
        &mut self,
        key: char,
        target: HotkeyTarget,
        help: impl Into<String>,
    ) -> Result<()> {
        validate(key, &target)?;
        let help = help.into();
        match self.bindings.iter_mut().find(|b| b.key == key) {
            Some(existing) => {
                log::debug!("rebinding hotkey {}", key_name(Key::Char(key)));
                existing.target = target;
                existing.help = help;
            },
            None => self.bindings.push(HotkeyBinding { key, target, help }),
        }
        Ok(())
    }

    /// Bind several keys in the given order.
    ///
    /// Every entry is validated before any is applied.
    pub fn update<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (char, (HotkeyTarget, String))>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        for (key, (target, _)) in &entries {
            validate(*key, target)?;
        }
        for (key, (target, help)) in entries {
            self.register(key, target, help)?;
        }
        Ok(())
    }

    /// Bind keys from an unordered map.
    ///
    /// Entries are applied sorted by help text (then by key) so the
    /// resulting order does not depend on map iteration order.
    pub fn update_unordered(&mut self, entries: HashMap<char, (HotkeyTarget, String)>) -> Result<()> {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.1.1.cmp(&b.1.1).then(a.0.cmp(&b.0)));
        self.update(entries)
    }

    pub fn resolve(&self, key: char) -> Option<&HotkeyBinding> {
        self.bindings.iter().find(|b| b.key == key)
    }

    pub fn contains(&self, key: char) -> bool {
        self.resolve(key).is_some()
    }

    /// `(key, help)` pairs in binding order.
    pub fn list(&self) -> Vec<(char, &str)> {
        self.bindings.iter().map(|b| (b.key, b.help.as_str())).collect()
    }

    pub fn bindings(&self) -> impl Iterator<Item = &HotkeyBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
