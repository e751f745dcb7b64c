//! Error types for keyloop.

use std::io;

/// Errors produced by the keyloop shell engine.
#[derive(Debug, thiserror::Error)]
pub enum KeyloopError {
    #[error("command error: {0}")]
    Command(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    /// A command panicked; the payload message is kept.
    #[error("panic: {0}")]
    Panic(String),

    /// A hotkey callable failed and the loop does not contain hotkey errors.
    #[error("hotkey {key} failed: {source}")]
    Hotkey {
        key: String,
        #[source]
        source: Box<KeyloopError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KeyloopError {
    /// Stable name of the error variant, recorded as the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command(_) => "Command",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::Arithmetic(_) => "Arithmetic",
            Self::Config(_) => "Config",
            Self::Store(_) => "Store",
            Self::Panic(_) => "Panic",
            Self::Hotkey { .. } => "Hotkey",
            Self::Io(_) => "Io",
            Self::TomlParse(_) => "TomlParse",
            Self::Json(_) => "Json",
        }
    }

    /// Render the error and its `source()` chain, outermost first.
    pub fn trace(&self) -> String {
        let mut lines = vec![format!("{}: {self}", self.kind())];
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            lines.push(format!("  caused by: {err}"));
            cause = err.source();
        }
        lines.join("\n")
    }

    /// True when the error came from an interrupted read (Ctrl-C at the OS level).
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::Interrupted)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, KeyloopError>;
