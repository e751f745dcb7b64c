//! Scenario tests for the shell loop.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

use keyloop_store::{FileStore, LogKind, RecordStore, WishKind};
use keyloop_types::config::LoopConfig;
use keyloop_types::error::KeyloopError;
use keyloop_types::input::{CTRL_D, Key, SpecialKey};
use serde_json::json;

use super::*;

fn somefunc() -> Box<dyn Command> {
    command_fn("somefunc", "Joins the args passed to it into a string", |args, _| {
        Ok(CommandOutput::Text(args.join(" ")))
    })
}

fn lame() -> Box<dyn Command> {
    command_fn("lame", "Raise an exception", |_, _| {
        let zero = 0i32;
        1i32.checked_div(zero)
            .map(|v| CommandOutput::Value(json!(v)))
            .ok_or_else(|| KeyloopError::Arithmetic("division by zero".into()))
    })
}

fn builder() -> ShellBuilder {
    Shell::builder().name("mine").command(somefunc()).command(lame())
}

fn counter(hits: &Rc<Cell<u32>>, by: u32) -> HotkeyTarget {
    let hits = Rc::clone(hits);
    HotkeyTarget::call(move || {
        hits.set(hits.get() + by);
        Ok(())
    })
}

fn run(shell: &mut Shell, mut input: ScriptedInput) -> String {
    let mut out = Vec::new();
    shell.run(&mut input, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn count(shell: &Shell, kind: LogKind) -> usize {
    shell.log().count(kind).unwrap()
}

// -- construction -------------------------------------------------------

#[test]
fn new_shell_has_builtins_only() {
    let shell = Shell::new(LoopConfig::default()).unwrap();
    assert_eq!(shell.commands().len(), 10);
    assert!(shell.hotkeys().is_empty());
    assert_eq!(shell.session().name(), "default");
    assert_eq!(shell.session().id(), 1);
    assert_eq!(shell.state(), LoopState::Idle);
}

#[test]
fn duplicate_builtin_name_is_config_error() {
    let err = Shell::builder()
        .command(command_fn("history", "shadow", |_, _| Ok(CommandOutput::None)))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), "Config");
}

#[test]
fn reserved_hotkey_is_config_error() {
    let err = Shell::builder()
        .hotkey(':', HotkeyTarget::call(|| Ok(())), "nope")
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), "Config");
}

#[test]
fn hotkey_to_unknown_command_is_config_error() {
    let err = Shell::builder()
        .hotkey('h', HotkeyTarget::command("nothing"), "broken")
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), "Config");
}

#[test]
fn mode_key_as_break_char_is_config_error() {
    let err = Shell::builder().break_char('?').build().unwrap_err();
    assert_eq!(err.kind(), "Config");
}

// -- colon-commands -----------------------------------------------------

#[test]
fn successful_command_records_one_result() {
    let mut shell = builder().build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("somefunc a b"));
    assert!(out.contains("a b"));
    let cmds = shell.log().commands(10).unwrap();
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].cmd, "somefunc");
    assert_eq!(cmds[0].args, vec!["a", "b"]);
    assert_eq!(cmds[0].value, json!("a b"));
    assert_eq!(count(&shell, LogKind::Errors), 0);
}

#[test]
fn failing_command_records_one_error() {
    let mut shell = builder().build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("lame"));
    let errors = shell.log().errors(10).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].cmd, "lame");
    assert!(errors[0].args.is_empty());
    assert_eq!(errors[0].error_type, "Arithmetic");
    assert!(errors[0].error_value.contains("division by zero"));
    assert_eq!(errors[0].func_doc, "Raise an exception");
    assert_eq!(count(&shell, LogKind::Commands), 0);
    assert!(out.contains("Arithmetic: arithmetic error: division by zero"));
    assert!(out.contains("cmd: lame"));
    assert!(out.contains("args: []"));
}

#[test]
fn failing_command_does_not_end_loop() {
    let mut shell = builder().build().unwrap();
    run(
        &mut shell,
        ScriptedInput::new().colon("lame").colon("lame 1 2").colon("somefunc ok"),
    );
    assert_eq!(count(&shell, LogKind::Errors), 2);
    assert_eq!(count(&shell, LogKind::Commands), 1);
    assert_eq!(shell.log().errors(1).unwrap()[0].args, vec!["1", "2"]);
}

#[test]
fn panicking_command_is_contained() {
    let mut shell = builder()
        .command(command_fn("explode", "Panic on purpose", |_, _| panic!("kaboom")))
        .build()
        .unwrap();
    run(
        &mut shell,
        ScriptedInput::new().colon("explode").colon("somefunc after"),
    );
    let errors = shell.log().errors(10).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, "Panic");
    assert!(errors[0].error_value.contains("kaboom"));
    assert_eq!(count(&shell, LogKind::Commands), 1);
}

#[test]
fn unknown_command_goes_to_wishlist() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new().colon("zzz").line("").colon("zzz"),
    );
    let wishes = shell.log().wishlist().unwrap();
    assert_eq!(wishes.len(), 1);
    assert_eq!(wishes[0].kind, WishKind::Command);
    assert_eq!(wishes[0].token, "zzz");
    assert_eq!(count(&shell, LogKind::Commands), 0);
    assert_eq!(count(&shell, LogKind::Errors), 0);
    assert!(out.contains("unknown command: zzz"));
    assert_eq!(out.matches("[NOT FULFILLED YET] cmd=zzz").count(), 1);
    assert_eq!(shell.typed_commands(), ["zzz", "zzz"]);
}

#[test]
fn lookup_is_exact() {
    let mut shell = builder().build().unwrap();
    run(
        &mut shell,
        ScriptedInput::new()
            .colon("somefun x")
            .line("")
            .colon("SOMEFUNC x"),
    );
    assert_eq!(count(&shell, LogKind::Commands), 0);
    assert_eq!(count(&shell, LogKind::WishlistCmds), 2);
}

#[test]
fn empty_and_aborted_lines_log_nothing() {
    let mut shell = builder().build().unwrap();
    run(
        &mut shell,
        ScriptedInput::new().colon("   ").key(':').abort().key('a'),
    );
    assert_eq!(count(&shell, LogKind::Commands), 0);
    assert_eq!(count(&shell, LogKind::Errors), 0);
    assert_eq!(count(&shell, LogKind::WishlistCmds), 0);
    assert!(shell.typed_commands().is_empty());
    assert_eq!(count(&shell, LogKind::Chars), 3);
}

// -- exclusion list -----------------------------------------------------

#[test]
fn excluded_command_skips_success_record() {
    let mut shell = builder().dont_log("somefunc").build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("somefunc a"));
    assert!(out.contains('a'));
    assert_eq!(count(&shell, LogKind::Commands), 0);
}

#[test]
fn exclusion_list_never_hides_keystrokes() {
    let mut shell = builder().dont_log("somefunc").build().unwrap();
    run(
        &mut shell,
        ScriptedInput::new()
            .colon("somefunc a")
            .colon("history")
            .colon("chars")
            .key('?'),
    );
    assert_eq!(count(&shell, LogKind::Commands), 0);
    assert_eq!(count(&shell, LogKind::Chars), 4);
    let keys: Vec<Key> = shell.log().chars(10).unwrap().into_iter().map(|e| e.key).collect();
    assert_eq!(
        keys,
        vec![Key::Char(':'), Key::Char(':'), Key::Char(':'), Key::Char('?')]
    );
}

#[test]
fn excluded_command_still_records_errors_by_default() {
    let mut shell = builder().dont_log("lame").build().unwrap();
    run(&mut shell, ScriptedInput::new().colon("lame"));
    assert_eq!(count(&shell, LogKind::Errors), 1);
}

#[test]
fn dont_log_errors_suppresses_error_records() {
    let config = LoopConfig {
        dont_log_errors: true,
        ..LoopConfig::default()
    };
    let mut shell = builder().config(config).dont_log("lame").build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("lame").colon("history x"));
    assert_eq!(count(&shell, LogKind::Errors), 0);
    assert!(out.contains("cmd: lame"));
}

#[test]
fn builtin_failure_is_recorded() {
    let mut shell = builder().build().unwrap();
    run(&mut shell, ScriptedInput::new().colon("history ten"));
    let errors = shell.log().errors(10).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, "InvalidArgument");
    assert_eq!(errors[0].args, vec!["ten"]);
}

// -- built-ins ----------------------------------------------------------

#[test]
fn history_lists_commands_without_logging_itself() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new().colon("somefunc a b").colon("history"),
    );
    assert!(out.contains("cmd=somefunc args=[\"a\", \"b\"]"));
    assert_eq!(count(&shell, LogKind::Commands), 1);
}

#[test]
fn history_limit_argument() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new()
            .colon("somefunc first")
            .colon("somefunc second")
            .colon("history 1"),
    );
    assert!(out.contains("args=[\"second\"]"));
    assert!(!out.contains("args=[\"first\"]"));
}

#[test]
fn errors_builtin_shows_failures() {
    let mut shell = builder().build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("lame").colon("errors"));
    assert!(out.contains("cmd=lame args=[] error_type=Arithmetic"));
}

#[test]
fn notes_and_cmds_builtins() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new()
            .note("first note")
            .colon("nope")
            .line("")
            .colon("notes")
            .colon("cmds"),
    );
    assert!(out.contains(" - first note"));
    assert!(out.contains("nope\nnotes\ncmds"));
}

#[test]
fn wishlist_builtin_lists_both_kinds() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new()
            .key('z')
            .line("")
            .colon("zzz")
            .line("sleep for a while")
            .colon("wishlist"),
    );
    assert!(out.contains("- ch=z\n- cmd=zzz message=sleep for a while"));
}

#[test]
fn shortcuts_builtin_lists_hotkeys() {
    let mut shell = builder()
        .hotkey('h', HotkeyTarget::command("history"), "show history")
        .build()
        .unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("shortcuts"));
    assert!(out.contains("h -- show history"));
}

#[test]
fn inspect_without_inspector_prints_notice() {
    let mut shell = builder().build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("inspect").colon("debug"));
    assert!(out.contains("inspect: no inspector attached"));
    assert!(out.contains("debug: no inspector attached"));
    assert_eq!(count(&shell, LogKind::Commands), 0);
}

#[test]
fn inspector_receives_view() {
    struct Recorder {
        seen: Rc<RefCell<Vec<(InspectorKind, String)>>>,
    }
    impl Inspector for Recorder {
        fn launch(
            &mut self,
            kind: InspectorKind,
            view: &InspectView<'_>,
            out: &mut dyn Write,
        ) -> keyloop_types::error::Result<()> {
            writeln!(out, "inspecting {}", view.session)?;
            self.seen
                .borrow_mut()
                .push((kind, view.session.namespace()));
            Ok(())
        }
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut shell = builder()
        .inspector(Box::new(Recorder {
            seen: Rc::clone(&seen),
        }))
        .build()
        .unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("debug").colon("inspect"));
    assert_eq!(
        *seen.borrow(),
        vec![
            (InspectorKind::Debugger, "mine:1".to_string()),
            (InspectorKind::Shell, "mine:1".to_string())
        ]
    );
    assert!(out.contains("inspecting mine:1"));
}

// -- notes --------------------------------------------------------------

#[test]
fn note_is_stored_exactly() {
    let mut shell = builder().build().unwrap();
    run(&mut shell, ScriptedInput::new().note("remember to check levels"));
    let notes = shell.log().notes(10).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].text, "remember to check levels");
    assert!(notes[0].extra.is_empty());
    assert_eq!(count(&shell, LogKind::Commands), 0);
}

#[test]
fn empty_note_is_stored() {
    let mut shell = builder().build().unwrap();
    run(&mut shell, ScriptedInput::new().note("").note("   "));
    let notes = shell.log().notes(10).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].text, "");
    assert_eq!(notes[1].text, "   ");
}

#[test]
fn aborted_note_is_skipped() {
    let fired = Rc::new(Cell::new(0));
    let hits = Rc::clone(&fired);
    let mut shell = builder()
        .note_hook(move |_| hits.set(hits.get() + 1))
        .build()
        .unwrap();
    run(&mut shell, ScriptedInput::new().key('-').abort());
    assert_eq!(count(&shell, LogKind::Notes), 0);
    assert_eq!(count(&shell, LogKind::Chars), 1);
    assert_eq!(fired.get(), 0);
}

#[test]
fn note_hooks_merge_data() {
    let stored = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&stored);
    let mut shell = builder()
        .pre_note_hook(|| BTreeMap::from([("level".to_string(), "3".to_string())]))
        .post_note_hook(|| BTreeMap::from([("mood".to_string(), "ok".to_string())]))
        .note_hook(move |note| sink.borrow_mut().push(note.text.clone()))
        .build()
        .unwrap();
    run(&mut shell, ScriptedInput::new().note("checked"));
    let notes = shell.log().notes(1).unwrap();
    assert_eq!(notes[0].extra["level"], "3");
    assert_eq!(notes[0].extra["mood"], "ok");
    assert_eq!(*stored.borrow(), vec!["checked".to_string()]);
}

#[test]
fn post_hook_overrides_pre_hook_keys() {
    let mut shell = builder()
        .pre_note_hook(|| BTreeMap::from([("k".to_string(), "pre".to_string())]))
        .post_note_hook(|| BTreeMap::from([("k".to_string(), "post".to_string())]))
        .build()
        .unwrap();
    run(&mut shell, ScriptedInput::new().note("x"));
    assert_eq!(shell.log().notes(1).unwrap()[0].extra["k"], "post");
}

// -- help ---------------------------------------------------------------

#[test]
fn help_toggles_between_banner_and_listing() {
    let mut shell = builder().build().unwrap();
    let mut input = ScriptedInput::new();

    let mut first = Vec::new();
    let state = shell.dispatch(Key::Char('?'), &mut input, &mut first).unwrap();
    assert_eq!(state, LoopState::Idle);
    assert_eq!(shell.state(), LoopState::Idle);
    let first = String::from_utf8(first).unwrap();
    assert!(first.contains("Loop forever"));
    assert!(!first.contains(".:: somefunc ::."));

    let mut second = Vec::new();
    let state = shell.dispatch(Key::Char('?'), &mut input, &mut second).unwrap();
    assert_eq!(state, LoopState::Idle);
    let second = String::from_utf8(second).unwrap();
    assert!(second.contains(".:: somefunc ::.\nJoins the args passed to it into a string"));
    assert!(second.contains(".:: history ::."));
    assert!(!second.contains("Loop forever"));
}

#[test]
fn other_key_resets_help_toggle() {
    let mut shell = builder().build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().keys("?x").line("").key('?'));
    assert_eq!(out.matches("Loop forever").count(), 2);
    assert!(!out.contains(".:: somefunc ::."));
}

// -- hotkeys ------------------------------------------------------------

#[test]
fn hotkey_runs_command_without_logging() {
    let mut shell = builder()
        .hotkey('h', HotkeyTarget::command("somefunc"), "show history")
        .build()
        .unwrap();
    run(&mut shell, ScriptedInput::new().key('h'));
    assert_eq!(count(&shell, LogKind::Chars), 1);
    assert_eq!(count(&shell, LogKind::Commands), 0);
    assert_eq!(count(&shell, LogKind::Errors), 0);
    assert_eq!(count(&shell, LogKind::WishlistChars), 0);
}

#[test]
fn history_hotkey_prints_history() {
    let mut shell = builder()
        .hotkey('h', HotkeyTarget::command("history"), "show history")
        .build()
        .unwrap();
    let out = run(&mut shell, ScriptedInput::new().colon("somefunc a").key('h'));
    assert!(out.contains("cmd=somefunc"));
    assert_eq!(count(&shell, LogKind::Commands), 1);
    assert_eq!(count(&shell, LogKind::Chars), 2);
}

#[test]
fn hotkey_rebinding_is_idempotent() {
    let hits = Rc::new(Cell::new(0));
    let mut shell = builder().hotkey('x', counter(&hits, 1), "once").build().unwrap();
    shell.add_hotkey('x', counter(&hits, 10), "ten").unwrap();
    assert_eq!(shell.hotkeys().len(), 1);
    run(&mut shell, ScriptedInput::new().key('x'));
    assert_eq!(hits.get(), 10);
}

#[test]
fn failing_hotkey_is_fatal_by_default() {
    let mut shell = builder()
        .hotkey(
            'f',
            HotkeyTarget::call(|| Err(KeyloopError::Command("boom".into()))),
            "fail",
        )
        .build()
        .unwrap();
    let mut input = ScriptedInput::new().key('f').key('a');
    let mut out = Vec::new();
    let err = shell.run(&mut input, &mut out).unwrap_err();
    assert_eq!(err.kind(), "Hotkey");
    assert!(err.to_string().contains("boom"));
    assert_eq!(shell.state(), LoopState::Terminal);
    assert_eq!(input.remaining(), 1);
    assert_eq!(count(&shell, LogKind::Errors), 0);
}

#[test]
fn contained_hotkey_failure_keeps_looping() {
    let config = LoopConfig {
        contain_hotkey_errors: true,
        ..LoopConfig::default()
    };
    let mut shell = builder()
        .config(config)
        .hotkey(
            'f',
            HotkeyTarget::call(|| Err(KeyloopError::Command("boom".into()))),
            "fail",
        )
        .build()
        .unwrap();
    let mut input = ScriptedInput::new().key('f').colon("somefunc after");
    let out = {
        let mut out = Vec::new();
        shell.run(&mut input, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    };
    assert!(out.contains("command error: boom"));
    assert_eq!(count(&shell, LogKind::Commands), 1);
    assert_eq!(count(&shell, LogKind::Errors), 0);
}

#[test]
fn unbound_key_is_wished_once() {
    let mut shell = builder().build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().key('z').line("").key('z'));
    assert!(out.contains("'z' 122"));
    assert_eq!(out.matches("[NOT FULFILLED YET] ch=z").count(), 1);
    let wishes = shell.log().wishlist().unwrap();
    assert_eq!(wishes.len(), 1);
    assert_eq!(wishes[0].kind, WishKind::Char);
}

#[test]
fn wish_answer_is_kept_and_repeated() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new()
            .colon("zzz")
            .line("  sleep for a while  ")
            .colon("zzz")
            .key('z')
            .line("zoom in")
            .key('z'),
    );
    let wishes = shell.log().wishlist().unwrap();
    assert_eq!(wishes.len(), 2);
    assert_eq!(wishes[0].wish.as_ref().unwrap().message, "zoom in");
    assert_eq!(wishes[1].wish.as_ref().unwrap().message, "sleep for a while");
    assert!(out.contains("[NOT FULFILLED YET] sleep for a while ("));
    assert!(out.contains("[NOT FULFILLED YET] zoom in ("));
    assert_eq!(count(&shell, LogKind::WishlistCmds), 1);
    assert_eq!(count(&shell, LogKind::Chars), 4);
}

#[test]
fn blank_or_aborted_wish_answer_keeps_bare_token() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new()
            .colon("zzz")
            .line("   ")
            .key('z')
            .abort()
            .colon("zzz"),
    );
    let wishes = shell.log().wishlist().unwrap();
    assert_eq!(wishes.len(), 2);
    assert!(wishes.iter().all(|w| w.wish.is_none()));
    assert!(out.contains("[NOT FULFILLED YET] cmd=zzz"));
}

#[test]
fn wishes_without_asking() {
    let config = LoopConfig {
        ask_wishes: false,
        ..LoopConfig::default()
    };
    let mut shell = builder().config(config).build().unwrap();
    let mut input = ScriptedInput::new().keys("zz").colon("zzz").colon("zzz");
    let mut out = Vec::new();
    shell.run(&mut input, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert_eq!(input.remaining(), 0);
    assert_eq!(count(&shell, LogKind::WishlistChars), 1);
    assert_eq!(count(&shell, LogKind::WishlistCmds), 1);
    assert!(out.contains("[NOT FULFILLED YET] ch=z"));
    assert!(out.contains("[NOT FULFILLED YET] cmd=zzz"));
}

#[test]
fn whitespace_and_special_keys_are_not_wished() {
    let mut shell = builder().build().unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new().keys(" \t").special(SpecialKey::Up),
    );
    assert!(out.contains("<up>"));
    assert_eq!(count(&shell, LogKind::WishlistChars), 0);
    assert_eq!(count(&shell, LogKind::Chars), 3);
}

#[test]
fn key_and_command_namespaces_are_independent() {
    let mut shell = builder()
        .hotkey('l', HotkeyTarget::command("somefunc"), "same letter")
        .build()
        .unwrap();
    run(&mut shell, ScriptedInput::new().colon("l").line("").key('l'));
    assert_eq!(count(&shell, LogKind::WishlistCmds), 1);
    assert_eq!(count(&shell, LogKind::WishlistChars), 0);
}

// -- termination --------------------------------------------------------

#[test]
fn break_char_runs_hotkey_then_stops() {
    let hits = Rc::new(Cell::new(0));
    let mut shell = builder()
        .break_char('q')
        .hotkey('q', counter(&hits, 1), "quit")
        .build()
        .unwrap();
    let mut input = ScriptedInput::new().keys("qa");
    let mut out = Vec::new();
    shell.run(&mut input, &mut out).unwrap();
    assert_eq!(hits.get(), 1);
    assert_eq!(input.remaining(), 1);
    assert_eq!(count(&shell, LogKind::Chars), 1);
    assert_eq!(shell.state(), LoopState::Terminal);
}

#[test]
fn unbound_break_char_stops() {
    let mut shell = builder().break_char('q').build().unwrap();
    let mut input = ScriptedInput::new().key('a').line("").keys("qb");
    let mut out = Vec::new();
    shell.run(&mut input, &mut out).unwrap();
    assert_eq!(input.remaining(), 1);
    assert_eq!(count(&shell, LogKind::WishlistChars), 1);
}

#[test]
fn ctrl_d_stops() {
    let mut shell = builder().build().unwrap();
    let mut input = ScriptedInput::new().key(CTRL_D).key('a');
    let mut out = Vec::new();
    shell.run(&mut input, &mut out).unwrap();
    assert_eq!(input.remaining(), 1);
    assert_eq!(count(&shell, LogKind::Chars), 1);
}

#[test]
fn interrupt_ends_loop() {
    let mut shell = builder().build().unwrap();
    let mut input = ScriptedInput::new().key('a').line("").interrupt().key('b');
    let mut out = Vec::new();
    shell.run(&mut input, &mut out).unwrap();
    assert_eq!(input.remaining(), 1);
    assert_eq!(shell.state(), LoopState::Terminal);
}

#[test]
fn run_prints_startup_and_prompt() {
    let mut shell = builder().prompt("\nmine> ").build().unwrap();
    let out = run(&mut shell, ScriptedInput::new().key('a'));
    assert!(out.starts_with(":docstrings to see all colon commands"));
    assert_eq!(out.matches("\nmine> ").count(), 2);
}

// -- late binding -------------------------------------------------------

#[test]
fn commands_can_register_more_commands() {
    let mut shell = builder()
        .command(command_fn("learn", "Teach the shell a new command", |_, ctx| {
            ctx.register_command(command_fn("late", "Added at runtime", |_, _| {
                Ok(CommandOutput::Text("late ran".into()))
            }));
            ctx.bind_hotkey('l', HotkeyTarget::command("late"), "run late");
            Ok(CommandOutput::None)
        }))
        .build()
        .unwrap();
    let out = run(
        &mut shell,
        ScriptedInput::new()
            .colon("late")
            .line("")
            .colon("learn")
            .colon("late")
            .key('l'),
    );
    assert_eq!(out.matches("late ran").count(), 2);
    assert_eq!(count(&shell, LogKind::WishlistCmds), 1);
    let cmds: Vec<String> = shell
        .log()
        .commands(10)
        .unwrap()
        .into_iter()
        .map(|r| r.cmd)
        .collect();
    assert_eq!(cmds, vec!["learn", "late"]);
    assert!(shell.hotkeys().contains('l'));
}

#[test]
fn replace_command_between_runs() {
    let mut shell = builder().build().unwrap();
    let replaced = shell
        .replace_command(command_fn("somefunc", "Shout instead", |args, _| {
            Ok(CommandOutput::Text(args.join(" ").to_uppercase()))
        }))
        .unwrap();
    assert!(replaced);
    let out = run(&mut shell, ScriptedInput::new().colon("somefunc hey"));
    assert!(out.contains("HEY"));
}

// -- persistence --------------------------------------------------------

#[test]
fn file_store_backed_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = builder()
        .store(Box::new(FileStore::open(dir.path()).unwrap()))
        .build()
        .unwrap();
    run(
        &mut shell,
        ScriptedInput::new()
            .colon("somefunc a")
            .note("saved")
            .key('z')
            .line("zoom in"),
    );
    drop(shell);

    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(store.len("mine:1:cmd_results").unwrap(), 1);
    assert_eq!(store.len("mine:1:notes").unwrap(), 1);
    assert_eq!(store.len("mine:1:chars").unwrap(), 3);
    assert!(store.set_contains("mine:1:wishlist_chars", "z").unwrap());
    let wishes = store.tail("mine:1:wishlist_chars", 10).unwrap();
    assert_eq!(wishes.len(), 1);
    assert_eq!(wishes[0]["message"], "zoom in");

    let next = builder().store(Box::new(store)).build().unwrap();
    assert_eq!(next.session().id(), 2);
    assert_eq!(next.log().count(LogKind::Commands).unwrap(), 0);
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    /// One input cycle: a lone key, or a mode key followed by its line.
    #[derive(Debug, Clone)]
    enum Step {
        Key(char),
        Colon(&'static str),
        Note(&'static str),
    }

    fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
        let step = prop_oneof![
            4 => proptest::sample::select(vec!['a', 'h', 'z', '1', '!', '?', ' ', '\t', 'é'])
                .prop_map(Step::Key),
            1 => proptest::sample::select(vec!["somefunc x", "lame", "zzz", "history 2", "", "chars"])
                .prop_map(Step::Colon),
            1 => proptest::sample::select(vec!["a note", "", "  "]).prop_map(Step::Note),
        ];
        proptest::collection::vec(step, 0..40)
    }

    fn script(steps: &[Step]) -> ScriptedInput {
        steps.iter().fold(ScriptedInput::new(), |input, step| match step {
            Step::Key(c) => input.key(*c),
            Step::Colon(line) => input.colon(line),
            Step::Note(text) => input.note(text),
        })
    }

    proptest! {
        #[test]
        fn loop_consumes_every_key_and_logs_each_once(steps in arb_steps()) {
            let config = LoopConfig {
                ask_wishes: false,
                ..LoopConfig::default()
            };
            let mut shell = builder()
                .config(config)
                .hotkey('h', HotkeyTarget::command("chars"), "show keys")
                .build()
                .unwrap();
            let mut input = script(&steps);
            let mut out = Vec::new();
            shell.run(&mut input, &mut out).unwrap();

            let colon = |wanted: &str| {
                steps.iter().filter(|s| matches!(s, Step::Colon(l) if *l == wanted)).count()
            };
            let notes = steps.iter().filter(|s| matches!(s, Step::Note(_))).count();
            prop_assert_eq!(input.remaining(), 0);
            prop_assert_eq!(shell.state(), LoopState::Terminal);
            prop_assert_eq!(count(&shell, LogKind::Chars), steps.len());
            prop_assert_eq!(count(&shell, LogKind::Commands), colon("somefunc x"));
            prop_assert_eq!(count(&shell, LogKind::Errors), colon("lame"));
            prop_assert_eq!(count(&shell, LogKind::Notes), notes);
            prop_assert_eq!(count(&shell, LogKind::WishlistCmds), usize::from(colon("zzz") > 0));
        }

        #[test]
        fn each_colon_command_logs_exactly_one_record(fails in proptest::collection::vec(any::<bool>(), 1..12)) {
            let mut shell = builder().build().unwrap();
            let input = fails.iter().fold(ScriptedInput::new(), |input, fail| {
                input.colon(if *fail { "lame" } else { "somefunc x" })
            });
            let mut input = input;
            let mut out = Vec::new();
            shell.run(&mut input, &mut out).unwrap();
            let failed = fails.iter().filter(|f| **f).count();
            prop_assert_eq!(count(&shell, LogKind::Errors), failed);
            prop_assert_eq!(count(&shell, LogKind::Commands), fails.len() - failed);
        }
    }
}
