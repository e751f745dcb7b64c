//! Hand-off to an external debugger or interactive shell.
//!
//! The engine has no debugger of its own. A host attaches an [`Inspector`]
//! and the `:debug` / `:inspect` commands pass it a view of the running
//! shell; control returns to the loop when the inspector returns.

use std::io::Write;

use keyloop_store::{Session, SessionLog};
use keyloop_types::config::LoopConfig;
use keyloop_types::error::Result;

use crate::command::CommandRegistry;
use crate::hotkey::HotkeyRegistry;

/// Which tool the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectorKind {
    /// `:debug`
    Debugger,
    /// `:inspect`
    Shell,
}

/// The shell state made available to an inspector.
pub struct InspectView<'a> {
    pub session: &'a Session,
    pub log: &'a SessionLog,
    pub commands: &'a CommandRegistry,
    pub hotkeys: &'a HotkeyRegistry,
    pub config: &'a LoopConfig,
}

/// External debugger / shell launcher.
pub trait Inspector {
    /// Run until the user leaves the inspector.
    fn launch(
        &mut self,
        kind: InspectorKind,
        view: &InspectView<'_>,
        out: &mut dyn Write,
    ) -> Result<()>;
}
