//! Session record store.
//!
//! Records are kept in append-only lists and small sets addressed by string
//! keys of the form `{namespace}:{kind}`. The [`RecordStore`] trait is the
//! persistence boundary; [`SessionLog`] layers typed records, timestamps and
//! session identity on top of it.

pub mod file;
pub mod memory;
pub mod record;
pub mod session;
pub mod session_log;

use keyloop_types::error::Result;
use serde_json::Value;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{
    CharEvent, CommandRecord, ErrorRecord, Failure, LogKind, NoteRecord, WishKind, WishRecord,
    WishlistEntry,
};
pub use session::Session;
pub use session_log::SessionLog;

/// Append-only list and set storage, keyed by string.
///
/// There is one writer per session, so implementations only need to keep
/// appends durable and in order.
pub trait RecordStore {
    /// Append one record to the end of the list at `key`.
    fn append(&mut self, key: &str, record: Value) -> Result<()>;

    /// The last `limit` records at `key`, oldest first.
    fn tail(&self, key: &str, limit: usize) -> Result<Vec<Value>>;

    /// Number of records at `key`.
    fn len(&self, key: &str) -> Result<usize>;

    /// Add `member` to the set at `key`. Returns `false` if already present.
    fn set_add(&mut self, key: &str, member: &str) -> Result<bool>;

    /// Whether the set at `key` contains `member`.
    fn set_contains(&self, key: &str, member: &str) -> Result<bool>;

    /// Members of the set at `key`, in insertion order.
    fn set_members(&self, key: &str) -> Result<Vec<String>>;

    /// Allocate the next instance id for the logical name `name`.
    ///
    /// Ids start at 1 and increase by one on every call.
    fn next_session_id(&mut self, name: &str) -> Result<u64>;
}
