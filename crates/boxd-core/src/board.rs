//! Status board: the topic-keyed store jobs publish observable state into.
//!
//! Jobs write, the HTTP API reads. Each topic holds the most recent JSON
//! record; [`StatusBoard::set`] replaces it wholesale while
//! [`StatusBoard::update`] merges keys into it. Ad-hoc notices for the UI go
//! into an unbounded FIFO drained by [`StatusBoard::drain_messages`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::Value;
use tracing::debug;

pub struct StatusBoard {
    topics: DashMap<String, Value>,
    messages: Mutex<VecDeque<String>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
            messages: Mutex::new(VecDeque::new()),
        }
    }

    /// Replace the record stored under `topic`.
    pub fn set(&self, topic: &str, record: Value) {
        debug!(topic, "board set");
        self.topics.insert(topic.to_string(), record);
    }

    /// Merge the keys of `partial` into the record stored under `topic`.
    ///
    /// Creates the topic when absent. If either side is not a JSON object
    /// there is nothing to merge into and `partial` replaces the record.
    pub fn update(&self, topic: &str, partial: Value) {
        debug!(topic, "board update");
        match self.topics.entry(topic.to_string()) {
            Entry::Occupied(mut slot) => {
                let replacement = match (slot.get_mut(), partial) {
                    (Value::Object(existing), Value::Object(incoming)) => {
                        existing.extend(incoming);
                        None
                    }
                    (_, other) => Some(other),
                };
                if let Some(record) = replacement {
                    slot.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(partial);
            }
        }
    }

    /// Append a diagnostic notice for the UI.
    pub fn push_message(&self, message: impl Into<String>) {
        self.lock_messages().push_back(message.into());
    }

    pub fn get(&self, topic: &str) -> Option<Value> {
        self.topics.get(topic).map(|r| r.value().clone())
    }

    /// Copy of every topic, sorted by name for deterministic output.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.topics
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Remove and return all queued messages, oldest first.
    pub fn drain_messages(&self) -> Vec<String> {
        self.lock_messages().drain(..).collect()
    }

    pub fn pending_messages(&self) -> usize {
        self.lock_messages().len()
    }

    // A panic while holding the lock cannot leave a VecDeque half-written,
    // so a poisoned queue is still usable.
    fn lock_messages(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}
