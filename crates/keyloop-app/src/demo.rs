//! The sample shell: two custom commands, three hotkeys and an inspector.

use std::io::{self, BufRead, Write};

use keyloop_store::{LogKind, RecordStore};
use keyloop_terminal::{
    Command, CommandOutput, HotkeyTarget, InspectView, Inspector, InspectorKind, Shell, command_fn,
};
use keyloop_types::config::LoopConfig;
use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::Key;

const LOG_KINDS: [LogKind; 6] = [
    LogKind::Chars,
    LogKind::Notes,
    LogKind::Commands,
    LogKind::Errors,
    LogKind::WishlistChars,
    LogKind::WishlistCmds,
];

pub fn build_shell(config: LoopConfig, store: Box<dyn RecordStore>) -> Result<Shell> {
    let mut shell = Shell::builder()
        .config(config)
        .store(store)
        .command(command_fn(
            "somefunc",
            "Joins the args passed to it into a string",
            |args, _| Ok(CommandOutput::Text(args.join(" "))),
        ))
        .command(command_fn("lame", "Divide one by zero", |_, _| {
            let zero = 0i64;
            1i64.checked_div(zero)
                .map(|v| CommandOutput::Text(v.to_string()))
                .ok_or_else(|| KeyloopError::Arithmetic("division by zero".into()))
        }))
        .hotkeys([
            (
                'h',
                (
                    HotkeyTarget::command("history"),
                    "display recent command history".to_string(),
                ),
            ),
            (
                'e',
                (
                    HotkeyTarget::command("errors"),
                    "display recent errors".to_string(),
                ),
            ),
        ])
        .inspector(Box::new(StateInspector))
        .build()?;

    shell.add_hotkey(
        'a',
        HotkeyTarget::call(|| {
            println!("hello");
            Ok(())
        }),
        "say hello",
    )?;
    Ok(shell)
}

/// Dumps shell state for `:debug`; a small line-oriented explorer for `:inspect`.
struct StateInspector;

impl StateInspector {
    fn dump(view: &InspectView<'_>, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "session: {}", view.session)?;
        for kind in LOG_KINDS {
            writeln!(out, "  {kind}: {}", view.log.count(kind)?)?;
        }
        writeln!(out, "commands: {}", view.commands.names().join(", "))?;
        let keys: Vec<String> = view
            .hotkeys
            .list()
            .into_iter()
            .map(|(c, _)| Key::Char(c).to_string())
            .collect();
        writeln!(out, "hotkeys: {}", keys.join(", "))?;
        Ok(())
    }

    fn explore(view: &InspectView<'_>, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "inspecting {}; try: state, config, help <cmd>, quit", view.session)?;
        let stdin = io::stdin();
        loop {
            write!(out, "inspect> ")?;
            out.flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(());
            }
            let mut words = line.split_whitespace();
            match words.next() {
                None => {},
                Some("quit" | "exit") => return Ok(()),
                Some("state") => Self::dump(view, out)?,
                Some("config") => {
                    writeln!(out, "{}", serde_json::to_string_pretty(view.config)?)?;
                },
                Some("help") => match words.next().and_then(|name| view.commands.get(name)) {
                    Some(cmd) => writeln!(out, "{}\n{}", cmd.usage(), cmd.description())?,
                    None => writeln!(out, "help <command>")?,
                },
                Some(other) => writeln!(out, "unknown: {other}")?,
            }
        }
    }
}

impl Inspector for StateInspector {
    fn launch(
        &mut self,
        kind: InspectorKind,
        view: &InspectView<'_>,
        out: &mut dyn Write,
    ) -> Result<()> {
        log::debug!("launching {kind:?} inspector");
        match kind {
            InspectorKind::Debugger => Self::dump(view, out),
            InspectorKind::Shell => Self::explore(view, out),
        }
    }
}
