//! Session journal: an append-only, in-memory record of session lifecycle
//! facts.
//!
//! DESIGN
//! ======
//! Every entry carries a severity level, a topic, and optional session/user
//! attribution. The journal keeps the newest `limit` entries in a ring and
//! answers queries newest-first through a small builder (session filter,
//! timestamp filter, severity floor, pagination). Nothing in the
//! synchronization path reads the journal; it exists for moderation and
//! support views in the embedding application.
//!
//! Entries can be exported as JSON with private data (the user's remote
//! address) redacted for non-administrative consumers.

#[cfg(test)]
#[path = "journal_test.rs"]
mod journal_test;

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::UserId;

/// Default number of entries kept before the oldest are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// Entry severity. Declared most severe first, so a severity floor keeps
/// entries that compare less than or equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Requires attention.
    Error,
    /// Acceptable errors.
    Warn,
    /// Useful for moderators.
    Info,
    /// Useful for developers.
    Debug,
}

impl LogLevel {
    /// Whether this level passes a severity floor.
    #[must_use]
    pub fn passes(self, floor: LogLevel) -> bool {
        self <= floor
    }
}

/// What an entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTopic {
    /// A user joined a session.
    Join,
    /// A user left a session.
    Leave,
    /// A user was kicked.
    Kick,
    /// A user was banned.
    Ban,
    /// A ban was lifted.
    Unban,
    /// A user was granted operator status.
    Op,
    /// Operator status was removed.
    Deop,
    /// Invalid data arrived from the session.
    BadData,
    /// A user tried something they are not allowed to do.
    RuleBreak,
    /// General status.
    Status,
}

/// User attribution for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogUser {
    pub id: UserId,
    pub name: String,
    /// Remote address, if known. Private data: omitted from redacted JSON.
    pub remote_addr: Option<String>,
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Milliseconds since Unix epoch. Set at construction.
    pub ts: i64,
    pub session: Option<Uuid>,
    pub user: Option<LogUser>,
    pub level: LogLevel,
    pub topic: LogTopic,
    pub message: String,
}

impl LogEntry {
    /// Start an entry with the given level and topic.
    #[must_use]
    pub fn about(level: LogLevel, topic: LogTopic) -> Self {
        Self { ts: now_ms(), session: None, user: None, level, topic, message: String::new() }
    }

    #[must_use]
    pub fn session(mut self, id: Uuid) -> Self {
        self.session = Some(id);
        self
    }

    #[must_use]
    pub fn user(mut self, user: LogUser) -> Self {
        self.user = Some(user);
        self
    }

    #[must_use]
    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.message = text.into();
        self
    }

    /// Export as JSON. With `redacted`, private data is omitted.
    #[must_use]
    pub fn to_json(&self, redacted: bool) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("ts".to_string(), json!(self.ts));
        map.insert("level".to_string(), json!(self.level));
        map.insert("topic".to_string(), json!(self.topic));
        map.insert("message".to_string(), json!(self.message));
        if let Some(session) = self.session {
            map.insert("session".to_string(), json!(session));
        }
        if let Some(user) = &self.user {
            let mut user_json = json!({ "id": user.id, "name": user.name });
            if !redacted {
                if let Some(addr) = &user.remote_addr {
                    user_json["remote_addr"] = json!(addr);
                }
            }
            map.insert("user".to_string(), user_json);
        }
        serde_json::Value::Object(map)
    }
}

/// Append-only in-memory journal with a bounded history.
#[derive(Debug)]
pub struct SessionJournal {
    entries: VecDeque<LogEntry>,
    limit: usize,
}

impl Default for SessionJournal {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl SessionJournal {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { entries: VecDeque::new(), limit }
    }

    /// Append an entry, dropping the oldest once the history limit is hit.
    pub fn record(&mut self, entry: LogEntry) {
        debug!(level = ?entry.level, topic = ?entry.topic, message = %entry.message, "journal");
        if self.limit > 0 && self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a query over the journal.
    #[must_use]
    pub fn query(&self) -> JournalQuery<'_> {
        JournalQuery { journal: self, session: None, after: None, floor: None, page: None }
    }
}

/// Query builder over a [`SessionJournal`].
#[derive(Debug)]
pub struct JournalQuery<'a> {
    journal: &'a SessionJournal,
    session: Option<Uuid>,
    after: Option<i64>,
    floor: Option<LogLevel>,
    page: Option<(usize, usize)>,
}

impl<'a> JournalQuery<'a> {
    /// Keep only entries attributed to this session.
    #[must_use]
    pub fn session(mut self, id: Uuid) -> Self {
        self.session = Some(id);
        self
    }

    /// Keep only entries with a timestamp greater than `ts`.
    #[must_use]
    pub fn after(mut self, ts: i64) -> Self {
        self.after = Some(ts);
        self
    }

    /// Keep only entries at least this severe.
    #[must_use]
    pub fn at_least(mut self, level: LogLevel) -> Self {
        self.floor = Some(level);
        self
    }

    /// Return the given page of results, `per_page` entries per page.
    #[must_use]
    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.page = Some((page, per_page));
        self
    }

    /// Run the query. Results are newest-first.
    #[must_use]
    pub fn get(self) -> Vec<&'a LogEntry> {
        let matches = self.journal.entries.iter().rev().filter(|entry| {
            if let Some(session) = self.session {
                if entry.session != Some(session) {
                    return false;
                }
            }
            if let Some(after) = self.after {
                if entry.ts <= after {
                    return false;
                }
            }
            if let Some(floor) = self.floor {
                if !entry.level.passes(floor) {
                    return false;
                }
            }
            true
        });
        match self.page {
            Some((page, per_page)) => matches.skip(page * per_page).take(per_page).collect(),
            None => matches.collect(),
        }
    }
}
