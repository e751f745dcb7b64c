//! Per-keystroke mode dispatch.
//!
//! The first key of an input cycle picks the mode: `:` reads a command
//! line, `-` reads a note, `?` shows help, a bound key runs its hotkey and
//! anything else is echoed and wished for. Every key is logged before it is
//! classified.

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use keyloop_store::{Failure, WishKind};
use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::{Key, key_name};

use crate::command::{CommandOutput, Context};
use crate::commands::{docstrings_text, shortcuts_text};
use crate::hotkey::HotkeyTarget;
use crate::input::InputSource;
use crate::shell::Shell;

/// Where the loop is in an input cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the first key of a cycle.
    Idle,
    /// Reading a command line after `:`.
    ColonPending,
    /// Reading a note after `-`.
    NotePending,
    /// Help was printed; returns to `Idle`.
    HelpShown,
    /// The loop is done.
    Terminal,
}

/// Builds a command [`Context`] from disjoint shell fields so a borrowed
/// command can run against it.
macro_rules! context {
    ($shell:ident, $out:expr) => {
        Context {
            out: $out,
            log: &$shell.log,
            commands: &$shell.commands,
            hotkeys: &$shell.hotkeys,
            config: &$shell.config,
            typed: &$shell.typed,
            inspector: $shell.inspector.as_deref_mut(),
            pending: &mut $shell.pending,
        }
    };
}

const RULE_WIDTH: usize = 70;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn print_output(out: &mut dyn Write, output: &CommandOutput) -> Result<()> {
    if let Some(text) = output.render() {
        writeln!(out, "{text}")?;
    }
    Ok(())
}

impl Shell {
    pub(crate) fn transition(&mut self, next: LoopState) {
        if self.state != next {
            log::trace!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Handle one keystroke and return the resulting state.
    ///
    /// Only store failures and uncontained hotkey failures are returned as
    /// errors; a failing colon-command is recorded and the shell stays live.
    pub fn dispatch(
        &mut self,
        key: Key,
        input: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> Result<LoopState> {
        self.log.log_char(key)?;
        if key != Key::Char('?') {
            self.help_presses = 0;
        }
        if key.is_hard_break() {
            log::debug!("break key {}", key_name(key));
            self.transition(LoopState::Terminal);
            return Ok(LoopState::Terminal);
        }

        match key {
            Key::Char(c) if self.config.is_break_char(c) => {
                writeln!(out, "{key}")?;
                if self.hotkeys.contains(c) {
                    self.invoke_hotkey(c, out)?;
                }
                log::debug!("break char {}", key_name(key));
                self.transition(LoopState::Terminal);
                return Ok(LoopState::Terminal);
            },
            Key::Char(':') => {
                self.transition(LoopState::ColonPending);
                self.colon_mode(input, out)?;
            },
            Key::Char('-') => {
                self.transition(LoopState::NotePending);
                self.note_mode(input, out)?;
            },
            Key::Char('?') => self.show_help(out)?,
            Key::Char(c) if self.hotkeys.contains(c) => {
                writeln!(out, "{key}")?;
                self.invoke_hotkey(c, out)?;
            },
            _ => self.unmatched(key, input, out)?,
        }

        self.apply_pending(out)?;
        self.transition(LoopState::Idle);
        Ok(LoopState::Idle)
    }

    fn colon_mode(&mut self, input: &mut dyn InputSource, out: &mut dyn Write) -> Result<()> {
        let Some(line) = input.read_line(":")? else {
            writeln!(out)?;
            return Ok(());
        };
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(());
        };
        let args: Vec<&str> = tokens.collect();
        self.typed.push(name.to_string());

        if !self.commands.contains(name) {
            log::warn!("unknown command: {name}");
            writeln!(out, "unknown command: {name}")?;
            return self.wish(WishKind::Command, name, input, out);
        }

        log::debug!("running :{name} {args:?}");
        let result = self.invoke_command(name, &args, out);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        match result {
            Ok(output) => {
                print_output(out, &output)?;
                if self.config.is_unlogged(name) {
                    Ok(())
                } else {
                    self.log.log_command(name, &args, output.to_value())
                }
            },
            Err(err) => self.report_failure(name, &args, &err, out),
        }
    }

    /// Run a resolved command, turning a panic into an error.
    fn invoke_command(&mut self, name: &str, args: &[&str], out: &mut dyn Write) -> Result<CommandOutput> {
        let Some(cmd) = self.commands.get(name) else {
            return Err(KeyloopError::Command(format!("unknown command: {name}")));
        };
        let mut ctx = context!(self, out);
        match panic::catch_unwind(AssertUnwindSafe(|| cmd.execute(args, &mut ctx))) {
            Ok(result) => result,
            Err(payload) => Err(KeyloopError::Panic(panic_message(payload.as_ref()))),
        }
    }

    fn report_failure(
        &mut self,
        name: &str,
        args: &[String],
        err: &KeyloopError,
        out: &mut dyn Write,
    ) -> Result<()> {
        log::error!("command {name} failed: {err}");
        let failure = Failure::from_error(err);
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "{}", failure.trace)?;
        writeln!(out, "\ncmd: {name}\nargs: {args:?}")?;
        if self.config.dont_log_errors && self.config.is_unlogged(name) {
            return Ok(());
        }
        let func_doc = self.commands.help_text(name).unwrap_or_default().to_string();
        self.log.log_error(name, args, &failure, &func_doc)
    }

    fn note_mode(&mut self, input: &mut dyn InputSource, out: &mut dyn Write) -> Result<()> {
        let mut extra = self.hooks.pre.as_ref().map(|hook| hook()).unwrap_or_default();
        let Some(line) = input.read_line("- ")? else {
            writeln!(out)?;
            return Ok(());
        };
        if let Some(post) = &self.hooks.post {
            extra.extend(post());
        }
        let note = self.log.log_note(&line, extra)?;
        if let Some(hook) = &self.hooks.on_note {
            hook(&note);
        }
        Ok(())
    }

    /// Odd presses show the banner, even presses list every command and hotkey.
    fn show_help(&mut self, out: &mut dyn Write) -> Result<()> {
        self.transition(LoopState::HelpShown);
        self.help_presses = self.help_presses.wrapping_add(1);
        if self.help_presses % 2 == 1 {
            writeln!(out, "\n{}\n", self.config.banner)?;
            write!(out, "{}", self.config.startup_message)?;
        } else {
            write!(out, "\n{}", docstrings_text(&self.commands))?;
            write!(out, "{}", shortcuts_text(&self.hotkeys))?;
        }
        Ok(())
    }

    fn invoke_hotkey(&mut self, c: char, out: &mut dyn Write) -> Result<()> {
        let result = match self.hotkeys.resolve(c).map(|b| b.target()) {
            None => return Ok(()),
            Some(HotkeyTarget::Call(hotkey)) => hotkey.invoke(),
            Some(HotkeyTarget::Command(name)) => match self.commands.get(name) {
                None => Err(KeyloopError::Command(format!("unknown command: {name}"))),
                Some(cmd) => {
                    let output = {
                        let mut ctx = context!(self, &mut *out);
                        cmd.execute(&[], &mut ctx)
                    };
                    output.and_then(|output| print_output(out, &output))
                },
            },
        };

        match result {
            Ok(()) => Ok(()),
            Err(err) if self.config.contain_hotkey_errors => {
                log::error!("hotkey {} failed: {err}", key_name(Key::Char(c)));
                writeln!(out, "{}", err.trace())?;
                Ok(())
            },
            Err(err) => Err(KeyloopError::Hotkey {
                key: key_name(Key::Char(c)),
                source: Box::new(err),
            }),
        }
    }

    fn unmatched(
        &mut self,
        key: Key,
        input: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> Result<()> {
        writeln!(out, "{}", key.describe())?;
        if key.is_wishable()
            && let Some(c) = key.as_char()
        {
            self.wish(WishKind::Char, &c.to_string(), input, out)?;
        }
        Ok(())
    }

    /// Put a missed token on the wishlist, or remind that it is already there.
    ///
    /// A fresh miss may be answered with what the token should do; a blank
    /// or aborted answer leaves the bare token.
    fn wish(
        &mut self,
        kind: WishKind,
        token: &str,
        input: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> Result<()> {
        if !self.log.wish(kind, token)? {
            if let Some(entry) = self.log.wish_entry(kind, token)? {
                writeln!(out, "{}", entry.reminder())?;
            }
            return Ok(());
        }
        if !self.config.ask_wishes {
            return Ok(());
        }
        let prompt = match kind {
            WishKind::Char => "what do you wish this key press did? ",
            WishKind::Command => "what do you wish this command did? ",
        };
        let Some(answer) = input.read_line(prompt)? else {
            writeln!(out)?;
            return Ok(());
        };
        let message = answer.trim();
        if !message.is_empty() {
            self.log.log_wish(kind, token, message)?;
            log::debug!("wished {}={token}: {message}", kind.label());
        }
        Ok(())
    }

    /// Apply registrations queued by commands during this cycle.
    fn apply_pending(&mut self, out: &mut dyn Write) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for cmd in pending.commands {
            let name = cmd.name().to_string();
            match self.commands.replace(cmd) {
                Ok(replaced) => log::debug!("registered :{name} (replaced: {replaced})"),
                Err(e) => {
                    log::warn!("deferred command rejected: {e}");
                    writeln!(out, "{e}")?;
                },
            }
        }
        for (key, target, help) in pending.hotkeys {
            if let Err(e) = self.add_hotkey(key, target, help) {
                log::warn!("deferred hotkey rejected: {e}");
                writeln!(out, "{e}")?;
            }
        }
        Ok(())
    }
}
