//! Long-polling loop over `getUpdates`.
//!
//! The poller owns the update cursor. Every update in a batch moves the cursor
//! past itself, whether or not its message is acted on, so filtered content can
//! never stall delivery. Messages from the target chat go through the ledger
//! and, when new, are handed to the deletion scheduler without waiting.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    domain::{ChatId, MessageRef, Update},
    errors::ApiError,
    ledger::DedupLedger,
    ports::BotApi,
    scheduler::DeletionScheduler,
    stats::RuntimeStats,
};

#[derive(Clone, Copy, Debug)]
pub struct PollTiming {
    /// Long-poll timeout passed to `getUpdates`.
    pub timeout: Duration,
    /// Pause after a successful cycle.
    pub pause: Duration,
    /// Cap for the error backoff.
    pub max_backoff: Duration,
}

impl PollTiming {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            timeout: cfg.poll_timeout,
            pause: cfg.poll_pause,
            max_backoff: cfg.poll_max_backoff,
        }
    }

    /// `min(failures * 2s, max_backoff)`.
    pub fn backoff_for(&self, consecutive_failures: u32) -> Duration {
        let secs = u64::from(consecutive_failures).saturating_mul(2);
        Duration::from_secs(secs).min(self.max_backoff)
    }
}

/// What one batch did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scheduled: Vec<MessageRef>,
    pub ignored: usize,
    pub duplicates: usize,
}

pub struct UpdatePoller {
    api: Arc<dyn BotApi>,
    ledger: Arc<DedupLedger>,
    deletions: DeletionScheduler,
    stats: Arc<RuntimeStats>,
    target: ChatId,
    delete_after: Duration,
    timing: PollTiming,
    cursor: i64,
    failures: u32,
}

impl UpdatePoller {
    pub fn new(
        cfg: &Config,
        api: Arc<dyn BotApi>,
        ledger: Arc<DedupLedger>,
        deletions: DeletionScheduler,
        stats: Arc<RuntimeStats>,
    ) -> Self {
        Self {
            api,
            ledger,
            deletions,
            stats,
            target: cfg.target_chat_id,
            delete_after: cfg.delete_after,
            timing: PollTiming::from_config(cfg),
            cursor: 0,
            failures: 0,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Poll until `cancel` fires. Errors never end the loop.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(chat_id = %self.target, "polling for updates");

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.poll_once() => polled,
            };

            let wait = match polled {
                Ok(_) => self.timing.pause,
                Err(e) => {
                    let wait = self.timing.backoff_for(self.failures);
                    warn!(
                        attempt = self.failures,
                        error = %e,
                        "getUpdates failed; retrying in {wait:?}"
                    );
                    wait
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(wait) => {}
            }
        }

        info!(cursor = self.cursor, "poller stopped");
    }

    /// One `getUpdates` round trip plus processing of its batch.
    pub async fn poll_once(&mut self) -> Result<CycleReport, ApiError> {
        match self.api.fetch_updates(self.cursor, self.timing.timeout).await {
            Ok(updates) => {
                self.failures = 0;
                self.stats.record_poll(true);
                Ok(self.process_batch(updates).await)
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                self.stats.record_poll(false);
                Err(e)
            }
        }
    }

    pub async fn process_batch(&mut self, updates: Vec<Update>) -> CycleReport {
        let mut report = CycleReport::default();

        for update in updates {
            self.advance_cursor(update.update_id);

            let Some(msg) = update.message else {
                continue;
            };

            if msg.chat_id != self.target {
                debug!(chat_id = %msg.chat_id, "ignoring message from non-target chat");
                report.ignored += 1;
                continue;
            }

            if !self.ledger.try_mark(msg.chat_id, msg.message_id).await {
                info!(
                    message_id = %msg.message_id,
                    "message already scheduled for deletion"
                );
                report.duplicates += 1;
                continue;
            }

            info!(
                message_id = %msg.message_id,
                from = %msg.sender_label(),
                chat = msg.chat_title.as_deref().unwrap_or(""),
                "new message"
            );

            let target = msg.reference();
            // Fire and forget; the task reports its own outcome.
            drop(self.deletions.schedule(target, self.delete_after));
            report.scheduled.push(target);
        }

        report
    }

    fn advance_cursor(&mut self, update_id: i64) {
        let next = update_id.saturating_add(1);
        if next > self.cursor {
            self.cursor = next;
            self.stats.set_cursor(next);
        }
    }
}
