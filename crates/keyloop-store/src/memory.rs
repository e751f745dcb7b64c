//! In-memory record store.
//!
//! Useful for unit tests and throwaway sessions. Lists and sets live in
//! `BTreeMap`s keyed by the full store key; nothing survives the process.

use std::collections::BTreeMap;

use keyloop_types::error::Result;
use serde_json::Value;

use crate::RecordStore;

/// A fully in-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: BTreeMap<String, Vec<Value>>,
    /// Sets keep insertion order; membership is checked linearly.
    sets: BTreeMap<String, Vec<String>>,
    sequences: BTreeMap<String, u64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys that hold a list or a set, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lists
            .keys()
            .chain(self.sets.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Slice out the last `limit` items, oldest first.
pub(crate) fn tail_of<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    let start = items.len().saturating_sub(limit);
    items[start..].to_vec()
}

impl RecordStore for MemoryStore {
    fn append(&mut self, key: &str, record: Value) -> Result<()> {
        self.lists.entry(key.to_string()).or_default().push(record);
        Ok(())
    }

    fn tail(&self, key: &str, limit: usize) -> Result<Vec<Value>> {
        Ok(self
            .lists
            .get(key)
            .map(|items| tail_of(items, limit))
            .unwrap_or_default())
    }

    fn len(&self, key: &str) -> Result<usize> {
        Ok(self.lists.get(key).map_or(0, Vec::len))
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<bool> {
        let set = self.sets.entry(key.to_string()).or_default();
        if set.iter().any(|m| m == member) {
            return Ok(false);
        }
        set.push(member.to_string());
        Ok(true)
    }

    fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self
            .sets
            .get(key)
            .is_some_and(|set| set.iter().any(|m| m == member)))
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.sets.get(key).cloned().unwrap_or_default())
    }

    fn next_session_id(&mut self, name: &str) -> Result<u64> {
        let seq = self.sequences.entry(name.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}
