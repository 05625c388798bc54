use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{BotIdentity, MessageRef, Update},
    errors::ApiError,
};

/// Hexagonal port for the remote bot API.
///
/// Telegram is the only implementation (`cleanbot-telegram`); tests use
/// scripted in-memory fakes.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// `getMe`. Run once at startup; any failure is fatal to the process.
    async fn verify_credential(&self) -> Result<BotIdentity, ApiError>;

    /// `getUpdates` restricted to message updates.
    ///
    /// Long-polls for at most `timeout`; an empty batch means nothing arrived.
    async fn fetch_updates(&self, offset: i64, timeout: Duration)
        -> Result<Vec<Update>, ApiError>;

    /// `deleteMessage`.
    async fn delete_message(&self, msg: MessageRef) -> Result<(), ApiError>;
}
