use serde::Serialize;

use crate::texts::Lang;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Wish group id (store-assigned).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupId(pub i64);

/// Wish id (store-assigned).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WishId(pub i64);

/// Identity behind an inbound update, as reported by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActingUser {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub chat_id: ChatId,
    pub language: Lang,
}

impl ActingUser {
    /// Name used when telling other people what this user did.
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            self.username.as_deref().unwrap_or("?")
        } else {
            &self.first_name
        }
    }
}
