//! Loop configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Code-only settings (hotkey callables, hooks, the record store)
//! are supplied through the shell builder instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Commands whose successful runs are not written to the command log.
pub const DEFAULT_DONT_LOG: &[&str] = &[
    "docstrings",
    "shortcuts",
    "errors",
    "history",
    "chars",
    "notes",
    "cmds",
    "wishlist",
    "debug",
    "inspect",
];

const DEFAULT_BANNER: &str = "\
Loop forever, receiving character input and performing actions

- ctrl+d or ctrl+c to break the loop
- ':' to enter a command (and any arguments)
- '-' to write a note that is saved with the session
- '?' to show this message (press again for every command and hotkey)";

const DEFAULT_STARTUP: &str = ":docstrings to see all colon commands\n:shortcuts to see all hotkeys\n";

/// Construction-time options for one shell instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Text shown before every keystroke read.
    pub prompt: String,
    /// Logical tool name; first half of the session namespace.
    pub name: String,
    /// Characters that end the loop (after running their hotkey, if bound).
    pub break_chars: Vec<char>,
    /// Commands excluded from success logging.
    pub dont_log: Vec<String>,
    /// Also suppress error records for commands in `dont_log`.
    pub dont_log_errors: bool,
    /// Print hotkey failures and keep looping instead of returning them.
    pub contain_hotkey_errors: bool,
    /// Ask what a newly wished key or command should do.
    pub ask_wishes: bool,
    /// Shown on the first `?` press.
    pub banner: String,
    /// Shown when the loop starts and after the banner.
    pub startup_message: String,
    /// Default `limit` for the history-style built-ins.
    pub history_limit: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            prompt: "\n> ".to_string(),
            name: "default".to_string(),
            break_chars: Vec::new(),
            dont_log: DEFAULT_DONT_LOG.iter().map(|s| s.to_string()).collect(),
            dont_log_errors: false,
            contain_hotkey_errors: false,
            ask_wishes: true,
            banner: DEFAULT_BANNER.to_string(),
            startup_message: DEFAULT_STARTUP.to_string(),
            history_limit: 10,
        }
    }
}

impl LoopConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded loop config from {}", path.display());
        Ok(config)
    }

    /// Whether successful runs of `cmd` skip the command log.
    pub fn is_unlogged(&self, cmd: &str) -> bool {
        self.dont_log.iter().any(|c| c == cmd)
    }

    /// Whether `c` is one of the configured break characters.
    pub fn is_break_char(&self, c: char) -> bool {
        self.break_chars.contains(&c)
    }
}
