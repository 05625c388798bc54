//! Telegram adapter (teloxide).
//!
//! This crate implements the `cleanbot-core` `BotApi` port over the Telegram
//! Bot API.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{AllowedUpdate, UpdateKind},
    ApiError as TgApiError, RequestError,
};
use tracing::debug;

use cleanbot_core::{
    config::Config,
    domain::{self, BotIdentity, ChatId, MessageId, MessageRef, Sender},
    errors::{ApiError, Error, RejectKind},
    ports::BotApi,
    Result,
};

#[derive(Clone)]
pub struct TelegramBotApi {
    bot: Bot,
}

impl TelegramBotApi {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Build the bot from config.
    ///
    /// The HTTP timeout must outlast the long-poll timeout, otherwise every
    /// quiet `getUpdates` would surface as a network error.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.api_request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;

        let mut bot = Bot::with_client(cfg.telegram_bot_token.clone(), client);
        if let Some(raw) = &cfg.telegram_api_url {
            let url = reqwest::Url::parse(raw)
                .map_err(|e| Error::Config(format!("TELEGRAM_API_URL is not a URL: {e}")))?;
            bot = bot.set_api_url(url);
        }

        Ok(Self::new(bot))
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }
}

/// Map a teloxide failure onto the core taxonomy.
///
/// Typed API errors are matched first; descriptions teloxide does not know
/// fall back to text classification.
pub fn map_err(e: RequestError) -> ApiError {
    match e {
        RequestError::Api(TgApiError::MessageToDeleteNotFound) => ApiError::Rejected {
            kind: RejectKind::NotFound,
            description: TgApiError::MessageToDeleteNotFound.to_string(),
        },
        RequestError::Api(TgApiError::MessageCantBeDeleted) => ApiError::Rejected {
            kind: RejectKind::Forbidden,
            description: TgApiError::MessageCantBeDeleted.to_string(),
        },
        RequestError::Api(TgApiError::Unknown(description)) => ApiError::rejected(description),
        RequestError::Api(other) => ApiError::Rejected {
            kind: RejectKind::Other,
            description: other.to_string(),
        },
        RequestError::Network(e) => ApiError::Transport(e.to_string()),
        RequestError::Io(e) => ApiError::Transport(e.to_string()),
        RequestError::InvalidJson { source, .. } => ApiError::Decode(source.to_string()),
        #[allow(unreachable_patterns)]
        other => ApiError::Rejected {
            kind: RejectKind::Other,
            description: other.to_string(),
        },
    }
}

pub fn convert_update(update: teloxide::types::Update) -> domain::Update {
    let update_id = i64::from(update.id);
    let message = match update.kind {
        UpdateKind::Message(msg) => Some(convert_message(&msg)),
        _ => None,
    };
    domain::Update { update_id, message }
}

fn convert_message(msg: &teloxide::types::Message) -> domain::Message {
    domain::Message {
        message_id: MessageId(msg.id.0),
        chat_id: ChatId(msg.chat.id.0),
        chat_title: msg.chat.title().map(str::to_string),
        sender: msg.from().map(|u| Sender {
            id: u.id.0 as i64,
            first_name: u.first_name.clone(),
            username: u.username.clone(),
        }),
        date: msg.date,
    }
}

#[async_trait]
impl BotApi for TelegramBotApi {
    async fn verify_credential(&self) -> std::result::Result<BotIdentity, ApiError> {
        let me = self.bot.get_me().await.map_err(map_err)?;
        Ok(BotIdentity {
            id: me.user.id.0 as i64,
            first_name: me.user.first_name.clone(),
            username: me.user.username.clone(),
        })
    }

    async fn fetch_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> std::result::Result<Vec<domain::Update>, ApiError> {
        let offset = i32::try_from(offset).unwrap_or(i32::MAX);
        let timeout = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX);

        let updates = self
            .bot
            .get_updates()
            .offset(offset)
            .timeout(timeout)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .map_err(map_err)?;

        debug!(count = updates.len(), offset, "getUpdates returned");
        Ok(updates.into_iter().map(convert_update).collect())
    }

    async fn delete_message(&self, msg: MessageRef) -> std::result::Result<(), ApiError> {
        self.bot
            .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
