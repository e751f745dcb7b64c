//! Built-in colon-commands present on every shell.

use std::fmt::Write as _;

use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::{Key, key_name};

use crate::command::{Command, CommandOutput, CommandRegistry, Context};
use crate::hotkey::HotkeyRegistry;
use crate::inspect::{InspectView, InspectorKind};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Register all built-in commands into a registry.
pub fn register_builtins(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(HistoryCmd))?;
    reg.register(Box::new(ErrorsCmd))?;
    reg.register(Box::new(CharsCmd))?;
    reg.register(Box::new(NotesCmd))?;
    reg.register(Box::new(CmdsCmd))?;
    reg.register(Box::new(DocstringsCmd))?;
    reg.register(Box::new(ShortcutsCmd))?;
    reg.register(Box::new(WishlistCmd))?;
    reg.register(Box::new(InspectorCmd(InspectorKind::Debugger)))?;
    reg.register(Box::new(InspectorCmd(InspectorKind::Shell)))?;
    Ok(())
}

/// Parse the optional numeric `limit` argument.
fn parse_limit(args: &[&str], default: usize) -> Result<usize> {
    match args.first() {
        None => Ok(default),
        Some(arg) => arg.parse::<usize>().map_err(|_| {
            KeyloopError::InvalidArgument(format!(
                "limit must be a non-negative integer, got {arg:?}"
            ))
        }),
    }
}

fn text_or(lines: Vec<String>, empty: &str) -> CommandOutput {
    if lines.is_empty() {
        CommandOutput::Text(empty.to_string())
    } else {
        CommandOutput::Text(lines.join("\n"))
    }
}

/// Help for every colon-command, sorted by name.
pub(crate) fn docstrings_text(commands: &CommandRegistry) -> String {
    let mut out = String::new();
    for (name, help) in commands.list() {
        if help.is_empty() {
            let _ = writeln!(out, ".:: {name} (no docs) ::.\n");
        } else {
            let _ = writeln!(out, ".:: {name} ::.\n{}\n", help.trim());
        }
    }
    out
}

/// One line per hotkey, in binding order.
pub(crate) fn shortcuts_text(hotkeys: &HotkeyRegistry) -> String {
    let mut out = String::new();
    for (key, help) in hotkeys.list() {
        let _ = writeln!(out, "{} -- {help}", key_name(Key::Char(key)));
    }
    out
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show successful colon commands used (default 10)"
    }
    fn usage(&self) -> &str {
        "history [limit]"
    }
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        let limit = parse_limit(args, ctx.config.history_limit)?;
        let lines = ctx
            .log
            .commands(limit)?
            .iter()
            .map(|r| {
                format!(
                    "{} -> cmd={} args={:?}",
                    r.ts.format(TS_FORMAT),
                    r.cmd,
                    r.args
                )
            })
            .collect();
        Ok(text_or(lines, "no commands recorded"))
    }
}

// ---------------------------------------------------------------------------
// errors
// ---------------------------------------------------------------------------

struct ErrorsCmd;
impl Command for ErrorsCmd {
    fn name(&self) -> &str {
        "errors"
    }
    fn description(&self) -> &str {
        "Show colon commands that failed, with their traces (default 10)"
    }
    fn usage(&self) -> &str {
        "errors [limit]"
    }
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        let limit = parse_limit(args, ctx.config.history_limit)?;
        let lines = ctx
            .log
            .errors(limit)?
            .iter()
            .map(|r| {
                format!(
                    "{} -> cmd={} args={:?} error_type={} error_value={}\n{}\n",
                    r.ts.format(TS_FORMAT),
                    r.cmd,
                    r.args,
                    r.error_type,
                    r.error_value,
                    r.traceback
                )
            })
            .collect();
        Ok(text_or(lines, "no errors recorded"))
    }
}

// ---------------------------------------------------------------------------
// chars
// ---------------------------------------------------------------------------

struct CharsCmd;
impl Command for CharsCmd {
    fn name(&self) -> &str {
        "chars"
    }
    fn description(&self) -> &str {
        "Show keys pressed during the current session (default 10)"
    }
    fn usage(&self) -> &str {
        "chars [limit]"
    }
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        let limit = parse_limit(args, ctx.config.history_limit)?;
        let lines = ctx
            .log
            .chars(limit)?
            .iter()
            .map(|e| format!("{} {}", e.ts.format(TS_FORMAT), key_name(e.key)))
            .collect();
        Ok(text_or(lines, "no keys recorded"))
    }
}

// ---------------------------------------------------------------------------
// notes
// ---------------------------------------------------------------------------

struct NotesCmd;
impl Command for NotesCmd {
    fn name(&self) -> &str {
        "notes"
    }
    fn description(&self) -> &str {
        "Show notes entered with '-' (default 10)"
    }
    fn usage(&self) -> &str {
        "notes [limit]"
    }
    fn execute(&self, args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        let limit = parse_limit(args, ctx.config.history_limit)?;
        let lines = ctx
            .log
            .notes(limit)?
            .iter()
            .map(|n| {
                let mut line = format!("{} - {}", n.ts.format(TS_FORMAT), n.text);
                for (k, v) in &n.extra {
                    let _ = write!(line, " [{k}={v}]");
                }
                line
            })
            .collect();
        Ok(text_or(lines, "no notes recorded"))
    }
}

// ---------------------------------------------------------------------------
// cmds
// ---------------------------------------------------------------------------

struct CmdsCmd;
impl Command for CmdsCmd {
    fn name(&self) -> &str {
        "cmds"
    }
    fn description(&self) -> &str {
        "Show colon commands typed during the current session"
    }
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        Ok(text_or(ctx.typed.to_vec(), "no commands typed"))
    }
}

// ---------------------------------------------------------------------------
// docstrings / shortcuts
// ---------------------------------------------------------------------------

struct DocstringsCmd;
impl Command for DocstringsCmd {
    fn name(&self) -> &str {
        "docstrings"
    }
    fn description(&self) -> &str {
        "Show the help text of every colon command"
    }
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(docstrings_text(ctx.commands)))
    }
}

struct ShortcutsCmd;
impl Command for ShortcutsCmd {
    fn name(&self) -> &str {
        "shortcuts"
    }
    fn description(&self) -> &str {
        "Show every hotkey shortcut"
    }
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        Ok(text_or(
            shortcuts_text(ctx.hotkeys).lines().map(str::to_string).collect(),
            "no hotkeys bound",
        ))
    }
}

// ---------------------------------------------------------------------------
// wishlist
// ---------------------------------------------------------------------------

struct WishlistCmd;
impl Command for WishlistCmd {
    fn name(&self) -> &str {
        "wishlist"
    }
    fn description(&self) -> &str {
        "Show the wishlist (hotkeys and commands that don't exist yet)"
    }
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        let lines = ctx
            .log
            .wishlist()?
            .iter()
            .map(|entry| format!("- {entry}"))
            .collect();
        Ok(text_or(lines, "wishlist is empty"))
    }
}

// ---------------------------------------------------------------------------
// debug / inspect
// ---------------------------------------------------------------------------

struct InspectorCmd(InspectorKind);
impl Command for InspectorCmd {
    fn name(&self) -> &str {
        match self.0 {
            InspectorKind::Debugger => "debug",
            InspectorKind::Shell => "inspect",
        }
    }
    fn description(&self) -> &str {
        match self.0 {
            InspectorKind::Debugger => {
                "Start the attached debugger. Leave it to continue back to the input loop"
            },
            InspectorKind::Shell => {
                "Start the attached interactive shell with this loop in scope. Leave it to continue"
            },
        }
    }
    fn execute(&self, _args: &[&str], ctx: &mut Context<'_>) -> Result<CommandOutput> {
        let view = InspectView {
            session: ctx.log.session(),
            log: ctx.log,
            commands: ctx.commands,
            hotkeys: ctx.hotkeys,
            config: ctx.config,
        };
        match ctx.inspector.as_deref_mut() {
            Some(inspector) => {
                inspector.launch(self.0, &view, ctx.out)?;
                Ok(CommandOutput::None)
            },
            None => Ok(CommandOutput::Text(format!(
                "{}: no inspector attached",
                self.name()
            ))),
        }
    }
}
