use std::fmt;

use chrono::{DateTime, Utc};

/// Telegram chat id (numeric; negative for groups).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

/// Telegram message id (unique within a chat only).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a `getUpdates` batch.
#[derive(Clone, Debug)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub message_id: MessageId,
    pub chat_id: ChatId,
    pub chat_title: Option<String>,
    pub sender: Option<Sender>,
    pub date: DateTime<Utc>,
}

impl Message {
    pub fn reference(&self) -> MessageRef {
        MessageRef::new(self.chat_id, self.message_id)
    }

    /// `@username`, else first name, else `Unknown`.
    pub fn sender_label(&self) -> String {
        match &self.sender {
            Some(s) => s.display_name(),
            None => "Unknown".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl Sender {
    pub fn display_name(&self) -> String {
        match self.username.as_deref() {
            Some(u) if !u.is_empty() => format!("@{u}"),
            _ if !self.first_name.is_empty() => self.first_name.clone(),
            _ => "Unknown".to_string(),
        }
    }
}

/// Who the bot token belongs to, as reported by `getMe`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(first: &str, username: Option<&str>) -> Sender {
        Sender {
            id: 7,
            first_name: first.to_string(),
            username: username.map(str::to_string),
        }
    }

    #[test]
    fn sender_label_prefers_username() {
        assert_eq!(sender("Ada", Some("ada")).display_name(), "@ada");
        assert_eq!(sender("Ada", Some("")).display_name(), "Ada");
        assert_eq!(sender("Ada", None).display_name(), "Ada");
        assert_eq!(sender("", None).display_name(), "Unknown");
    }

    #[test]
    fn message_without_sender_is_unknown() {
        let msg = Message {
            message_id: MessageId(1),
            chat_id: ChatId(-100),
            chat_title: None,
            sender: None,
            date: Utc::now(),
        };
        assert_eq!(msg.sender_label(), "Unknown");
        assert_eq!(msg.reference(), MessageRef::new(ChatId(-100), MessageId(1)));
    }
}
