//! Scripted in-memory `BotApi` for unit tests.

use std::{
    collections::VecDeque,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use crate::{
    domain::{BotIdentity, ChatId, Message, MessageId, MessageRef, Sender, Update},
    errors::ApiError,
    ports::BotApi,
};

#[derive(Default)]
pub(crate) struct ScriptedApi {
    batches: Mutex<VecDeque<Result<Vec<Update>, ApiError>>>,
    deletes: Mutex<VecDeque<Result<(), ApiError>>>,
    fetches: Mutex<Vec<(i64, Instant)>>,
    delete_calls: Mutex<Vec<(MessageRef, Instant)>>,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_batch(&self, batch: Result<Vec<Update>, ApiError>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub(crate) fn push_delete(&self, result: Result<(), ApiError>) {
        self.deletes.lock().unwrap().push_back(result);
    }

    pub(crate) fn fetches(&self) -> Vec<(i64, Instant)> {
        self.fetches.lock().unwrap().clone()
    }

    pub(crate) fn delete_calls(&self) -> Vec<(MessageRef, Instant)> {
        self.delete_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotApi for ScriptedApi {
    async fn verify_credential(&self) -> Result<BotIdentity, ApiError> {
        Ok(BotIdentity {
            id: 1,
            first_name: "Clean Bot".to_string(),
            username: Some("clean_bot".to_string()),
        })
    }

    async fn fetch_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, ApiError> {
        self.fetches.lock().unwrap().push((offset, Instant::now()));
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Nothing scripted: behave like a quiet long poll.
                tokio::time::sleep(timeout).await;
                Ok(Vec::new())
            }
        }
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<(), ApiError> {
        self.delete_calls.lock().unwrap().push((msg, Instant::now()));
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

pub(crate) fn update(update_id: i64, chat: i64, message_id: i32) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: MessageId(message_id),
            chat_id: ChatId(chat),
            chat_title: Some("Test group".to_string()),
            sender: Some(Sender {
                id: 99,
                first_name: "Ada".to_string(),
                username: None,
            }),
            date: Utc::now(),
        }),
    }
}

pub(crate) fn transient() -> ApiError {
    ApiError::rejected("Internal Server Error: restart")
}

/// Paused-clock sleeps land on millisecond ticks; allow for that rounding.
pub(crate) fn assert_close(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(5);
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= slack,
        "expected ~{expected:?}, got {actual:?}"
    );
}
