//! Record types written to the session logs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use keyloop_types::input::Key;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The lists and sets kept per session. The string form is the key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Chars,
    Notes,
    Commands,
    Errors,
    WishlistChars,
    WishlistCmds,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chars => "chars",
            Self::Notes => "notes",
            Self::Commands => "cmd_results",
            Self::Errors => "errors",
            Self::WishlistChars => "wishlist_chars",
            Self::WishlistCmds => "wishlist_cmds",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A colon-command that returned normally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub cmd: String,
    pub args: Vec<String>,
    /// What the command returned, as JSON.
    pub value: Value,
    pub ts: DateTime<Utc>,
}

/// A colon-command that failed or panicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub cmd: String,
    pub args: Vec<String>,
    pub error_type: String,
    pub error_value: String,
    pub traceback: String,
    /// Help text of the failing command.
    pub func_doc: String,
    pub ts: DateTime<Utc>,
}

/// A free-text note entered after `-`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub text: String,
    /// Data merged in from the pre/post note hooks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    pub ts: DateTime<Utc>,
}

/// One raw keystroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharEvent {
    pub key: Key,
    pub ts: DateTime<Utc>,
}

/// Which namespace an unresolved token missed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishKind {
    Char,
    Command,
}

impl WishKind {
    pub fn log_kind(self) -> LogKind {
        match self {
            Self::Char => LogKind::WishlistChars,
            Self::Command => LogKind::WishlistCmds,
        }
    }

    /// Short label used when listing the wishlist.
    pub fn label(self) -> &'static str {
        match self {
            Self::Char => "ch",
            Self::Command => "cmd",
        }
    }
}

/// What the user said an unbound key or command should do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishRecord {
    pub token: String,
    pub message: String,
    pub ts: DateTime<Utc>,
}

/// A key or command name that was tried but has no binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub kind: WishKind,
    pub token: String,
    /// The latest answer to the wish prompt, if one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wish: Option<WishRecord>,
}

impl WishlistEntry {
    /// Line printed when the same token misses again.
    pub fn reminder(&self) -> String {
        match &self.wish {
            Some(wish) => format!(
                "[NOT FULFILLED YET] {} ({})",
                wish.message,
                wish.ts.format("%Y-%m-%d %H:%M:%S")
            ),
            None => format!("[NOT FULFILLED YET] {}={}", self.kind.label(), self.token),
        }
    }
}

impl fmt::Display for WishlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind.label(), self.token)?;
        if let Some(wish) = &self.wish {
            write!(f, " message={}", wish.message)?;
        }
        Ok(())
    }
}

/// Captured failure of a command invocation, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: String,
    pub message: String,
    pub trace: String,
}

impl Failure {
    pub fn from_error(err: &keyloop_types::error::KeyloopError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            trace: err.trace(),
        }
    }
}
