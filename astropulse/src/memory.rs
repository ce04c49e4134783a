//! Session-keyed conversation memory shared across reasoning episodes.
//!
//! Each session owns one chronological turn log. Episodes read a snapshot at
//! start and, only on success, append their `(query, final_answer)` pair —
//! cancelled or failed episodes leave memory untouched. The log is bounded:
//! once `max_turns` is reached the oldest turns are dropped, so long-running
//! processes do not grow without limit.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

/// Speaker of a remembered turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One remembered conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Ordered, bounded turn log for a single conversation.
///
/// A single lock guards both append and snapshot; episodes are otherwise
/// independent, so no finer-grained locking is needed. Append order is the
/// only cross-episode ordering guarantee.
#[derive(Debug)]
pub struct ConversationMemory {
    turns: Mutex<Vec<Turn>>,
    max_turns: usize,
}

impl ConversationMemory {
    /// Creates an empty log holding at most `max_turns` turns.
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Mutex::new(Vec::new()),
            max_turns: max_turns.max(2),
        }
    }

    /// Appends one turn, evicting the oldest turns beyond the bound.
    pub async fn append(&self, role: Role, text: impl Into<String>) {
        let mut turns = self.turns.lock().await;
        turns.push(Turn {
            role,
            text: text.into(),
        });
        let len = turns.len();
        if len > self.max_turns {
            turns.drain(..len - self.max_turns);
        }
    }

    /// Returns a copy of the log in append order.
    pub async fn snapshot(&self) -> Vec<Turn> {
        self.turns.lock().await.clone()
    }

    /// Number of remembered turns.
    pub async fn len(&self) -> usize {
        self.turns.lock().await.len()
    }

    /// Whether nothing has been remembered yet.
    pub async fn is_empty(&self) -> bool {
        self.turns.lock().await.is_empty()
    }
}

/// Hands out per-session memory handles, creating sessions on first use.
#[derive(Debug)]
pub struct ConversationStore {
    sessions: RwLock<HashMap<String, Arc<ConversationMemory>>>,
    max_turns: usize,
}

impl ConversationStore {
    /// Creates a store whose sessions are bounded to `max_turns` each.
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Returns the memory for `id`, creating it if absent.
    pub async fn session(&self, id: &str) -> Arc<ConversationMemory> {
        if let Some(memory) = self.sessions.read().await.get(id) {
            return Arc::clone(memory);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(ConversationMemory::new(self.max_turns))),
        )
    }

    /// Number of sessions created so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
