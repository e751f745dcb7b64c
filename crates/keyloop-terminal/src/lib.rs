//! Keystroke shell engine.
//!
//! A [`Shell`] reads one key at a time and routes it by mode: colon-commands
//! are resolved by name in a [`CommandRegistry`], single-key shortcuts in a
//! [`HotkeyRegistry`]. Every key, note, command result and command failure is
//! recorded in the session log; unresolved keys and commands go to the
//! wishlist.

pub mod command;
mod commands;
pub mod dispatch;
pub mod hotkey;
pub mod input;
pub mod inspect;
pub mod shell;

#[cfg(test)]
mod tests;

/// A single colon-command.
pub use command::Command;
/// Wrap a closure as a boxed command.
pub use command::command_fn;
/// Value returned by a command.
pub use command::CommandOutput;
/// Name → command table.
pub use command::CommandRegistry;
/// What a running command can see and queue.
pub use command::Context;
/// Register the built-in history, help and wishlist commands into a registry.
pub use commands::register_builtins;
/// Mode state of the input loop.
pub use dispatch::LoopState;
pub use hotkey::{Hotkey, HotkeyRegistry, HotkeyTarget};
/// Keystroke and line source read by the loop.
pub use input::{InputSource, ScriptedInput};
pub use inspect::{InspectView, Inspector, InspectorKind};
pub use shell::{Shell, ShellBuilder};
