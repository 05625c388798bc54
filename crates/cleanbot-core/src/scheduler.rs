//! Deferred deletion of observed messages.
//!
//! Every accepted message gets its own task: sleep for the configured delay,
//! then call `deleteMessage` with a small linear-backoff retry budget. Tasks are
//! independent of each other and of the poller; nothing cancels them once
//! spawned, so a process shutdown simply drops whatever is still pending.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    domain::MessageRef,
    errors::{ApiError, RejectKind},
    ports::BotApi,
    stats::RuntimeStats,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_attempts: cfg.delete_attempts.max(1),
            backoff_step: cfg.delete_retry_step,
        }
    }

    /// Wait after failed attempt `attempt` (1-based) before the next one.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}

/// How a deletion task ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    /// Telegram no longer has the message (deleted by someone else).
    AlreadyGone,
    /// Too old, or the bot lacks the permission.
    NotDeletable,
    /// Retry budget spent on non-terminal errors.
    Abandoned { attempts: u32, last_error: ApiError },
}

#[derive(Clone)]
pub struct DeletionScheduler {
    api: Arc<dyn BotApi>,
    policy: RetryPolicy,
    stats: Arc<RuntimeStats>,
}

impl DeletionScheduler {
    pub fn new(api: Arc<dyn BotApi>, policy: RetryPolicy, stats: Arc<RuntimeStats>) -> Self {
        Self { api, policy, stats }
    }

    /// Spawn the deletion task for `msg`. The handle may be dropped.
    pub fn schedule(&self, msg: MessageRef, delay: Duration) -> JoinHandle<DeletionOutcome> {
        info!(
            chat_id = %msg.chat_id,
            message_id = %msg.message_id,
            "message scheduled for deletion in {delay:?}"
        );

        self.stats.task_started();
        let scheduler = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let outcome = scheduler.delete_with_retry(msg).await;
            scheduler.stats.task_finished();
            outcome
        })
    }

    async fn delete_with_retry(&self, msg: MessageRef) -> DeletionOutcome {
        let max = self.policy.max_attempts;
        let mut attempt = 1u32;

        loop {
            match self.api.delete_message(msg).await {
                Ok(()) => {
                    info!(chat_id = %msg.chat_id, message_id = %msg.message_id, "deleted message");
                    self.stats.record_deleted();
                    return DeletionOutcome::Deleted;
                }
                Err(ApiError::Rejected {
                    kind: RejectKind::NotFound,
                    ..
                }) => {
                    warn!(
                        chat_id = %msg.chat_id,
                        message_id = %msg.message_id,
                        "message already deleted or not found"
                    );
                    self.stats.record_already_gone();
                    return DeletionOutcome::AlreadyGone;
                }
                Err(ApiError::Rejected {
                    kind: RejectKind::Forbidden,
                    ..
                }) => {
                    warn!(
                        chat_id = %msg.chat_id,
                        message_id = %msg.message_id,
                        "message can't be deleted (too old or no permission)"
                    );
                    self.stats.record_not_deletable();
                    return DeletionOutcome::NotDeletable;
                }
                Err(e) if attempt >= max => {
                    error!(
                        chat_id = %msg.chat_id,
                        message_id = %msg.message_id,
                        attempt,
                        max,
                        error = %e,
                        "giving up on message deletion"
                    );
                    self.stats.record_abandoned();
                    return DeletionOutcome::Abandoned {
                        attempts: attempt,
                        last_error: e,
                    };
                }
                Err(e) => {
                    warn!(
                        chat_id = %msg.chat_id,
                        message_id = %msg.message_id,
                        attempt,
                        max,
                        error = %e,
                        "failed to delete message"
                    );
                    sleep(self.policy.backoff_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
