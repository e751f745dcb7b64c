//! The shell object and its input loop.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use keyloop_store::{MemoryStore, NoteRecord, RecordStore, Session, SessionLog};
use keyloop_types::config::LoopConfig;
use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::{Key, key_name};

use crate::command::{Command, CommandRegistry, Pending};
use crate::commands::register_builtins;
use crate::dispatch::LoopState;
use crate::hotkey::{HotkeyRegistry, HotkeyTarget};
use crate::input::InputSource;
use crate::inspect::Inspector;

/// Returns auxiliary data merged into a note's `extra` map.
pub type NoteDataHook = Box<dyn Fn() -> BTreeMap<String, String>>;

/// Receives every stored note.
pub type NoteHook = Box<dyn Fn(&NoteRecord)>;

#[derive(Default)]
pub(crate) struct NoteHooks {
    /// Runs as soon as `-` is pressed.
    pub(crate) pre: Option<NoteDataHook>,
    /// Runs after the note line is read.
    pub(crate) post: Option<NoteDataHook>,
    pub(crate) on_note: Option<NoteHook>,
}

/// An interactive keystroke shell bound to one session.
pub struct Shell {
    pub(crate) config: LoopConfig,
    pub(crate) commands: CommandRegistry,
    pub(crate) hotkeys: HotkeyRegistry,
    pub(crate) log: SessionLog,
    pub(crate) hooks: NoteHooks,
    pub(crate) inspector: Option<Box<dyn Inspector>>,
    pub(crate) state: LoopState,
    /// Consecutive `?` presses.
    pub(crate) help_presses: u32,
    /// Command tokens typed this session, resolved or not.
    pub(crate) typed: Vec<String>,
    pub(crate) pending: Pending,
}

impl Shell {
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    /// A shell with only the built-in commands and an in-memory store.
    pub fn new(config: LoopConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Add a command. Fails if the name is taken.
    pub fn register_command(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        self.commands.register(cmd)
    }

    /// Add or replace a command.
    pub fn replace_command(&mut self, cmd: Box<dyn Command>) -> Result<bool> {
        self.commands.replace(cmd)
    }

    /// Bind a hotkey, replacing any previous binding for `key`.
    pub fn add_hotkey(&mut self, key: char, target: HotkeyTarget, help: impl Into<String>) -> Result<()> {
        check_target(&self.commands, key, &target)?;
        self.hotkeys.register(key, target, help)
    }

    /// Bind hotkeys in the given order.
    pub fn update_hotkeys<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (char, (HotkeyTarget, String))>,
    {
        let entries: Vec<_> = entries.into_iter().collect();
        for (key, (target, _)) in &entries {
            check_target(&self.commands, *key, target)?;
        }
        self.hotkeys.update(entries)
    }

    /// Bind hotkeys from an unordered map, ordered by help text.
    pub fn update_hotkeys_unordered(&mut self, entries: HashMap<char, (HotkeyTarget, String)>) -> Result<()> {
        for (key, (target, _)) in &entries {
            check_target(&self.commands, *key, target)?;
        }
        self.hotkeys.update_unordered(entries)
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn hotkeys(&self) -> &HotkeyRegistry {
        &self.hotkeys
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn session(&self) -> &Session {
        self.log.session()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn typed_commands(&self) -> &[String] {
        &self.typed
    }

    /// Read and dispatch keys until a break key, end of input or an
    /// interrupt.
    ///
    /// Colon-command failures are recorded and never end the loop. Hotkey
    /// failures (unless contained by config) and store failures do.
    pub fn run(&mut self, input: &mut dyn InputSource, out: &mut dyn Write) -> Result<()> {
        log::info!("loop started for session {}", self.session());
        write!(out, "{}", self.config.startup_message)?;
        self.transition(LoopState::Idle);
        loop {
            write!(out, "{}", self.config.prompt)?;
            out.flush()?;
            let key = match input.read_key() {
                Ok(Some(key)) => key,
                Ok(None) => {
                    log::debug!("input exhausted");
                    break;
                },
                Err(e) if e.is_interrupt() => {
                    log::debug!("read interrupted");
                    break;
                },
                Err(e) => {
                    self.transition(LoopState::Terminal);
                    return Err(e);
                },
            };
            match self.dispatch(key, input, out) {
                Ok(LoopState::Terminal) => break,
                Ok(_) => {},
                Err(e) => {
                    self.transition(LoopState::Terminal);
                    return Err(e);
                },
            }
        }
        self.transition(LoopState::Terminal);
        writeln!(out)?;
        log::info!("loop finished for session {}", self.session());
        Ok(())
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("session", self.session())
            .field("state", &self.state)
            .field("commands", &self.commands.names())
            .field("hotkeys", &self.hotkeys.len())
            .finish_non_exhaustive()
    }
}

fn check_target(commands: &CommandRegistry, key: char, target: &HotkeyTarget) -> Result<()> {
    if let HotkeyTarget::Command(name) = target
        && !commands.contains(name)
    {
        return Err(KeyloopError::Config(format!(
            "hotkey {} targets unknown command: {name}",
            key_name(Key::Char(key))
        )));
    }
    Ok(())
}

/// Construction-time setup for a [`Shell`].
#[derive(Default)]
pub struct ShellBuilder {
    config: LoopConfig,
    commands: Vec<Box<dyn Command>>,
    hotkeys: Vec<(char, (HotkeyTarget, String))>,
    unordered: HashMap<char, (HotkeyTarget, String)>,
    store: Option<Box<dyn RecordStore>>,
    hooks: NoteHooks,
    inspector: Option<Box<dyn Inspector>>,
}

impl ShellBuilder {
    pub fn config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Logical name used as the session namespace.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn break_char(mut self, c: char) -> Self {
        if !self.config.break_chars.contains(&c) {
            self.config.break_chars.push(c);
        }
        self
    }

    /// Exclude `cmd` from success logging.
    pub fn dont_log(mut self, cmd: impl Into<String>) -> Self {
        let cmd = cmd.into();
        if !self.config.is_unlogged(&cmd) {
            self.config.dont_log.push(cmd);
        }
        self
    }

    pub fn command(mut self, cmd: Box<dyn Command>) -> Self {
        self.commands.push(cmd);
        self
    }

    pub fn hotkey(mut self, key: char, target: HotkeyTarget, help: impl Into<String>) -> Self {
        self.hotkeys.push((key, (target, help.into())));
        self
    }

    /// Ordered hotkey entries, bound in the given order.
    pub fn hotkeys<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (char, (HotkeyTarget, String))>,
    {
        self.hotkeys.extend(entries);
        self
    }

    /// Unordered hotkey entries, bound after the ordered ones sorted by help text.
    pub fn hotkeys_unordered(mut self, entries: HashMap<char, (HotkeyTarget, String)>) -> Self {
        self.unordered.extend(entries);
        self
    }

    pub fn store(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn pre_note_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> BTreeMap<String, String> + 'static,
    {
        self.hooks.pre = Some(Box::new(hook));
        self
    }

    pub fn post_note_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> BTreeMap<String, String> + 'static,
    {
        self.hooks.post = Some(Box::new(hook));
        self
    }

    pub fn note_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&NoteRecord) + 'static,
    {
        self.hooks.on_note = Some(Box::new(hook));
        self
    }

    pub fn inspector(mut self, inspector: Box<dyn Inspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Validate the setup and open a new session.
    ///
    /// Duplicate or reserved command names, hotkeys on reserved keys or
    /// targeting unknown commands, and break chars that collide with a
    /// mode key are all `Config` errors.
    pub fn build(self) -> Result<Shell> {
        let mut commands = CommandRegistry::new();
        register_builtins(&mut commands)?;
        for cmd in self.commands {
            commands.register(cmd)?;
        }

        for c in &self.config.break_chars {
            if matches!(c, ':' | '-' | '?') {
                return Err(KeyloopError::Config(format!(
                    "break char {} collides with a mode key",
                    key_name(Key::Char(*c))
                )));
            }
        }

        let targets = self
            .hotkeys
            .iter()
            .map(|(key, (target, _))| (*key, target))
            .chain(self.unordered.iter().map(|(key, (target, _))| (*key, target)));
        for (key, target) in targets {
            check_target(&commands, key, target)?;
        }
        let mut hotkeys = HotkeyRegistry::new();
        hotkeys.update(self.hotkeys)?;
        hotkeys.update_unordered(self.unordered)?;

        let store = self.store.unwrap_or_else(|| Box::new(MemoryStore::new()));
        let log = SessionLog::open(&self.config.name, store)?;
        log::debug!(
            "shell built with {} commands and {} hotkeys",
            commands.len(),
            hotkeys.len()
        );
        Ok(Shell {
            config: self.config,
            commands,
            hotkeys,
            log,
            hooks: self.hooks,
            inspector: self.inspector,
            state: LoopState::Idle,
            help_presses: 0,
            typed: Vec::new(),
            pending: Pending::default(),
        })
    }
}
