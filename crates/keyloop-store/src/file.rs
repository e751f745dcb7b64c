//! Durable record store backed by JSON-lines files.
//!
//! Every key maps to one file under the store root. Lists are `.jsonl`
//! files with one record per line, sets are `.set` files with one JSON
//! string per line, and session id sequences are `.seq` files holding a
//! single integer.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use keyloop_types::error::{KeyloopError, Result};
use serde_json::Value;

use crate::RecordStore;
use crate::memory::tail_of;

/// A [`RecordStore`] that appends to files on disk.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::debug!("file store opened at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{ext}", file_stem(key)))
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")?;
        file.sync_data()?;
        Ok(())
    }

    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    fn read_values(&self, path: &Path) -> Result<Vec<Value>> {
        self.read_lines(path)?
            .iter()
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    KeyloopError::Store(format!("corrupt record in {}: {e}", path.display()))
                })
            })
            .collect()
    }

    fn read_set(&self, key: &str) -> Result<Vec<String>> {
        let path = self.path_for(key, "set");
        let mut members = Vec::new();
        for value in self.read_values(&path)? {
            match value {
                Value::String(s) => members.push(s),
                other => {
                    return Err(KeyloopError::Store(format!(
                        "non-string set member in {}: {other}",
                        path.display()
                    )));
                },
            }
        }
        Ok(members)
    }
}

/// Map a store key onto a portable file stem.
///
/// `:` separates key segments and becomes `.`; anything outside
/// `[A-Za-z0-9_-]` becomes `_`.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            ':' => '.',
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => c,
            _ => '_',
        })
        .collect()
}

impl RecordStore for FileStore {
    fn append(&mut self, key: &str, record: Value) -> Result<()> {
        let line = serde_json::to_string(&record)?;
        self.append_line(&self.path_for(key, "jsonl"), &line)
    }

    fn tail(&self, key: &str, limit: usize) -> Result<Vec<Value>> {
        let values = self.read_values(&self.path_for(key, "jsonl"))?;
        Ok(tail_of(&values, limit))
    }

    fn len(&self, key: &str) -> Result<usize> {
        Ok(self.read_lines(&self.path_for(key, "jsonl"))?.len())
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<bool> {
        if self.read_set(key)?.iter().any(|m| m == member) {
            return Ok(false);
        }
        let line = serde_json::to_string(member)?;
        self.append_line(&self.path_for(key, "set"), &line)?;
        Ok(true)
    }

    fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.read_set(key)?.iter().any(|m| m == member))
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.read_set(key)
    }

    fn next_session_id(&mut self, name: &str) -> Result<u64> {
        let path = self.path_for(name, "seq");
        let current = match fs::read_to_string(&path) {
            Ok(text) => text.trim().parse::<u64>().map_err(|e| {
                KeyloopError::Store(format!("bad sequence in {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        let next = current + 1;
        fs::write(&path, next.to_string())?;
        Ok(next)
    }
}
