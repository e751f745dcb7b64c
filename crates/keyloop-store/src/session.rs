//! Session identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::LogKind;

/// One running shell instance: a logical tool name plus an instance id.
///
/// Fixed for the lifetime of the shell. `{name}:{id}` is the namespace that
/// prefixes every key the session writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    name: String,
    id: u64,
}

impl Session {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Key prefix for everything this session stores.
    pub fn namespace(&self) -> String {
        format!("{}:{}", self.name, self.id)
    }

    /// Full store key for one of the session's logs.
    pub fn key(&self, kind: LogKind) -> String {
        format!("{}:{}", self.namespace(), kind.as_str())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.id)
    }
}
