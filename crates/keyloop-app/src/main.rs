//! keyloop desktop demo.
//!
//! Runs the sample shell on the controlling terminal. The loop config is
//! read from the first argument or `KEYLOOP_CONFIG`; session records are
//! written under `KEYLOOP_DATA` (default `.keyloop`). Ctrl-C or Ctrl-D quits.

mod demo;
mod term_input;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use keyloop_store::FileStore;
use keyloop_types::config::LoopConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve config from CLI arg or KEYLOOP_CONFIG, else the demo defaults.
    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("KEYLOOP_CONFIG").ok())
    {
        Some(path) => LoopConfig::load(Path::new(&path))
            .with_context(|| format!("loading config from {path}"))?,
        None => LoopConfig {
            prompt: "\nmyprompt> ".to_string(),
            name: "mine".to_string(),
            ..LoopConfig::default()
        },
    };

    let data_dir = std::env::var("KEYLOOP_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".keyloop"));
    let store = FileStore::open(&data_dir)
        .with_context(|| format!("opening record store at {}", data_dir.display()))?;
    log::info!("Recording sessions under {}", data_dir.display());

    let mut shell = demo::build_shell(config, Box::new(store))?;
    let mut input = term_input::TerminalInput::new();
    let mut stdout = std::io::stdout();
    shell.run(&mut input, &mut stdout)?;

    log::info!("Session {} ended", shell.session());
    Ok(())
}
