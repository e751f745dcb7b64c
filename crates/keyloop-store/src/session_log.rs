//! Typed, timestamped access to one session's logs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use keyloop_types::error::{KeyloopError, Result};
use keyloop_types::input::Key;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::RecordStore;
use crate::record::{
    CharEvent, CommandRecord, ErrorRecord, Failure, LogKind, NoteRecord, WishKind, WishRecord,
    WishlistEntry,
};
use crate::session::Session;

/// One session's view of a [`RecordStore`].
///
/// Owns the store, assigns the session id on open, and stamps every record.
/// Timestamps never go backwards within a session even if the wall clock
/// does.
pub struct SessionLog {
    session: Session,
    store: Box<dyn RecordStore>,
    last_ts: Option<DateTime<Utc>>,
}

impl SessionLog {
    /// Start a new session for `name`, allocating its instance id from the store.
    pub fn open(name: &str, mut store: Box<dyn RecordStore>) -> Result<Self> {
        if name.is_empty() {
            return Err(KeyloopError::Config("session name must not be empty".into()));
        }
        let id = store.next_session_id(name)?;
        let session = Session::new(name, id);
        log::info!("session {session} opened");
        Ok(Self {
            session,
            store,
            last_ts: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_ts {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_ts = Some(ts);
        ts
    }

    fn push<T: Serialize>(&mut self, kind: LogKind, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        let key = self.session.key(kind);
        self.store.append(&key, value)
    }

    fn read<T: DeserializeOwned>(&self, kind: LogKind, limit: usize) -> Result<Vec<T>> {
        let key = self.session.key(kind);
        self.store
            .tail(&key, limit)?
            .into_iter()
            .map(|v: Value| serde_json::from_value(v).map_err(KeyloopError::from))
            .collect()
    }

    /// Record one raw keystroke.
    pub fn log_char(&mut self, key: Key) -> Result<()> {
        let ts = self.stamp();
        self.push(LogKind::Chars, &CharEvent { key, ts })
    }

    /// Record a note and return what was stored.
    pub fn log_note(&mut self, text: &str, extra: BTreeMap<String, String>) -> Result<NoteRecord> {
        let note = NoteRecord {
            text: text.to_string(),
            extra,
            ts: self.stamp(),
        };
        self.push(LogKind::Notes, &note)?;
        Ok(note)
    }

    /// Record a successful colon-command.
    pub fn log_command(&mut self, cmd: &str, args: &[String], value: Value) -> Result<()> {
        let record = CommandRecord {
            cmd: cmd.to_string(),
            args: args.to_vec(),
            value,
            ts: self.stamp(),
        };
        self.push(LogKind::Commands, &record)
    }

    /// Record a failed colon-command.
    pub fn log_error(
        &mut self,
        cmd: &str,
        args: &[String],
        failure: &Failure,
        func_doc: &str,
    ) -> Result<()> {
        let record = ErrorRecord {
            cmd: cmd.to_string(),
            args: args.to_vec(),
            error_type: failure.kind.clone(),
            error_value: failure.message.clone(),
            traceback: failure.trace.clone(),
            func_doc: func_doc.to_string(),
            ts: self.stamp(),
        };
        self.push(LogKind::Errors, &record)
    }

    /// Add a token to the wishlist. Returns `false` if it was already there.
    pub fn wish(&mut self, kind: WishKind, token: &str) -> Result<bool> {
        let key = self.session.key(kind.log_kind());
        self.store.set_add(&key, token)
    }

    pub fn is_wished(&self, kind: WishKind, token: &str) -> Result<bool> {
        let key = self.session.key(kind.log_kind());
        self.store.set_contains(&key, token)
    }

    /// Record what the user wants a wished token to do.
    ///
    /// Answers live in the list under the same key as the token set; the
    /// latest answer for a token wins.
    pub fn log_wish(&mut self, kind: WishKind, token: &str, message: &str) -> Result<WishRecord> {
        let wish = WishRecord {
            token: token.to_string(),
            message: message.to_string(),
            ts: self.stamp(),
        };
        self.push(kind.log_kind(), &wish)?;
        Ok(wish)
    }

    fn wishes(&self, kind: WishKind) -> Result<Vec<WishRecord>> {
        self.read(kind.log_kind(), usize::MAX)
    }

    /// The wishlist entry for `token`, if it has been wished.
    pub fn wish_entry(&self, kind: WishKind, token: &str) -> Result<Option<WishlistEntry>> {
        if !self.is_wished(kind, token)? {
            return Ok(None);
        }
        let wish = self.wishes(kind)?.into_iter().rev().find(|w| w.token == token);
        Ok(Some(WishlistEntry {
            kind,
            token: token.to_string(),
            wish,
        }))
    }

    pub fn commands(&self, limit: usize) -> Result<Vec<CommandRecord>> {
        self.read(LogKind::Commands, limit)
    }

    pub fn errors(&self, limit: usize) -> Result<Vec<ErrorRecord>> {
        self.read(LogKind::Errors, limit)
    }

    pub fn notes(&self, limit: usize) -> Result<Vec<NoteRecord>> {
        self.read(LogKind::Notes, limit)
    }

    pub fn chars(&self, limit: usize) -> Result<Vec<CharEvent>> {
        self.read(LogKind::Chars, limit)
    }

    /// Every wishlist entry, keys first, each in insertion order.
    pub fn wishlist(&self) -> Result<Vec<WishlistEntry>> {
        let mut entries = Vec::new();
        for kind in [WishKind::Char, WishKind::Command] {
            let key = self.session.key(kind.log_kind());
            let wishes = self.wishes(kind)?;
            for token in self.store.set_members(&key)? {
                let wish = wishes.iter().rev().find(|w| w.token == token).cloned();
                entries.push(WishlistEntry { kind, token, wish });
            }
        }
        Ok(entries)
    }

    /// Number of entries in one of the session's lists or sets.
    pub fn count(&self, kind: LogKind) -> Result<usize> {
        let key = self.session.key(kind);
        match kind {
            LogKind::WishlistChars | LogKind::WishlistCmds => {
                Ok(self.store.set_members(&key)?.len())
            },
            _ => self.store.len(&key),
        }
    }
}

impl std::fmt::Debug for SessionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLog")
            .field("session", &self.session)
            .field("last_ts", &self.last_ts)
            .finish_non_exhaustive()
    }
}
