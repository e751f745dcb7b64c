//! Command trait, invocation context, and the colon-command registry.

use std::collections::BTreeMap;
use std::io::Write;

use keyloop_store::SessionLog;
use keyloop_types::config::LoopConfig;
use keyloop_types::error::{KeyloopError, Result};
use serde_json::Value;

use crate::hotkey::{HotkeyRegistry, HotkeyTarget};
use crate::inspect::Inspector;

/// Prefix that marks a name as private; such names are never commands.
pub const RESERVED_PREFIX: char = '_';

/// Value returned by a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Structured data; printed as pretty JSON.
    Value(Value),
    /// Command produced no visible output.
    None,
}

impl CommandOutput {
    /// The value stored in the command log.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Value(v) => v.clone(),
            Self::None => Value::Null,
        }
    }

    /// Text to print at the prompt, if any.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(text) if text.is_empty() => None,
            Self::Text(text) => Some(text.clone()),
            Self::Value(Value::Null) | Self::None => None,
            Self::Value(v) => Some(serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())),
        }
    }
}

/// Registrations queued by a running command, applied once the loop is idle.
#[derive(Default)]
pub(crate) struct Pending {
    pub(crate) commands: Vec<Box<dyn Command>>,
    pub(crate) hotkeys: Vec<(char, HotkeyTarget, String)>,
}

/// Everything a command can see while it runs.
pub struct Context<'a> {
    /// Terminal output.
    pub out: &'a mut dyn Write,
    /// The session's logs (read-only while a command runs).
    pub log: &'a SessionLog,
    pub commands: &'a CommandRegistry,
    pub hotkeys: &'a HotkeyRegistry,
    pub config: &'a LoopConfig,
    /// Command names typed at the prompt this session, resolved or not.
    pub typed: &'a [String],
    /// External debugger / shell launcher, if the host attached one.
    pub inspector: Option<&'a mut (dyn Inspector + 'static)>,
    pub(crate) pending: &'a mut Pending,
}

impl Context<'_> {
    /// Add or replace a command once the current one returns.
    pub fn register_command(&mut self, cmd: Box<dyn Command>) {
        self.pending.commands.push(cmd);
    }

    /// Bind a hotkey once the current command returns.
    pub fn bind_hotkey(&mut self, key: char, target: HotkeyTarget, help: impl Into<String>) {
        self.pending.hotkeys.push((key, target, help.into()));
    }
}

/// A single colon-command.
///
/// Commands take only a variable-length list of string arguments.
pub trait Command {
    /// The command name (what the user types after `:`).
    fn name(&self) -> &str;

    /// Help text shown by `:docstrings`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "history \[limit\]").
    fn usage(&self) -> &str {
        ""
    }

    /// Execute the command with the given arguments.
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput>;
}

/// A command backed by a closure. Built with [`command_fn`].
pub struct FnCommand<F> {
    name: String,
    help: String,
    func: F,
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&[&str], &mut Context<'_>) -> Result<CommandOutput>,
{
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.help
    }
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        (self.func)(args, ctx)
    }
}

/// Wrap a closure as a boxed command, ready for registration.
pub fn command_fn<F>(name: impl Into<String>, help: impl Into<String>, func: F) -> Box<dyn Command>
where
    F: Fn(&[&str], &mut Context<'_>) -> Result<CommandOutput> + 'static,
{
    Box::new(FnCommand {
        name: name.into(),
        help: help.into(),
        func,
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(KeyloopError::Config("command name must not be empty".into()));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(KeyloopError::Config(format!(
            "command name uses reserved prefix '{RESERVED_PREFIX}': {name}"
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(KeyloopError::Config(format!(
            "command name contains whitespace: {name:?}"
        )));
    }
    Ok(())
}

/// Name → command table. Lookup is exact and case-sensitive.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new command. A name that is already taken is an error.
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        validate_name(cmd.name())?;
        if self.commands.contains_key(cmd.name()) {
            return Err(KeyloopError::Config(format!(
                "duplicate command: {}",
                cmd.name()
            )));
        }
        self.commands.insert(cmd.name().to_string(), cmd);
        Ok(())
    }

    /// Register a command, replacing any existing one with the same name.
    ///
    /// Returns `true` if a previous command was replaced.
    pub fn replace(&mut self, cmd: Box<dyn Command>) -> Result<bool> {
        validate_name(cmd.name())?;
        Ok(self
            .commands
            .insert(cmd.name().to_string(), cmd)
            .is_some())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Help text of a command; empty if it has none.
    pub fn help_text(&self, name: &str) -> Option<&str> {
        self.commands.get(name).map(|c| c.description())
    }

    /// `(name, help)` pairs sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
