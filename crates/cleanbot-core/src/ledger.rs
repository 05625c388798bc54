//! In-memory record of messages that already have a deletion scheduled.
//!
//! Telegram may hand the same message out more than once (a long poll retried
//! after a network hiccup, or a cursor that failed to advance). The ledger makes
//! sure each `(chat, message)` pair is scheduled exactly once for as long as the
//! deletion can still be pending.

use std::{collections::HashMap, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use crate::domain::{ChatId, MessageId, MessageRef};

pub struct DedupLedger {
    retention: Duration,
    seen: Mutex<HashMap<MessageRef, Instant>>,
}

impl DedupLedger {
    /// `retention` should be at least the deletion delay; entries younger than
    /// that still guard a pending task.
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record the pair if unseen. Returns false for a duplicate.
    pub async fn try_mark(&self, chat_id: ChatId, message_id: MessageId) -> bool {
        self.try_mark_at(MessageRef::new(chat_id, message_id), Instant::now())
            .await
    }

    pub async fn try_mark_at(&self, key: MessageRef, now: Instant) -> bool {
        let mut seen = self.seen.lock().await;
        if seen.contains_key(&key) {
            return false;
        }
        seen.insert(key, now);

        // Lazy sweep; only inserts pay for it.
        if let Some(cutoff) = now.checked_sub(self.retention) {
            seen.retain(|_, first_seen| *first_seen >= cutoff);
        }
        true
    }

    pub async fn contains(&self, key: MessageRef) -> bool {
        self.seen.lock().await.contains_key(&key)
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
