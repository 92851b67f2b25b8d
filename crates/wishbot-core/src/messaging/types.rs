use std::ops::Range;

use crate::domain::{ActingUser, ChatId, MessageRef, UserId};

/// Transport-neutral inbound update.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(CommandMessage),
    Text(TextMessage),
    Callback(CallbackPress),
}

impl IncomingUpdate {
    pub fn from_user(&self) -> &ActingUser {
        match self {
            IncomingUpdate::Command(c) => &c.from,
            IncomingUpdate::Text(t) => &t.from,
            IncomingUpdate::Callback(q) => &q.from,
        }
    }

    /// Chat that receives replies to this update.
    pub fn chat_id(&self) -> ChatId {
        match self {
            IncomingUpdate::Command(c) => c.chat_id,
            IncomingUpdate::Text(t) => t.chat_id,
            IncomingUpdate::Callback(q) => q.chat_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IncomingUpdate::Command(_) => "command",
            IncomingUpdate::Text(_) => "text",
            IncomingUpdate::Callback(_) => "callback",
        }
    }
}

/// A message starting with the command marker (`/`).
#[derive(Clone, Debug)]
pub struct CommandMessage {
    pub chat_id: ChatId,
    pub from: ActingUser,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub from: ActingUser,
    pub text: String,
    pub entities: Vec<Entity>,
}

#[derive(Clone, Debug)]
pub struct CallbackPress {
    pub chat_id: ChatId,
    pub from: ActingUser,
    pub callback_id: String,
    pub data: String,
    /// The message carrying the pressed button, if the platform still exposes it.
    pub message: Option<MessageRef>,
}

/// A formatting entity inside a text message.
///
/// `offset`/`length` are in UTF-16 code units, as Telegram reports them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// `@username` written in the text.
    Mention,
    /// Mention of a user without a username; the platform resolved the user.
    TextMention { user_id: UserId, first_name: String },
    Url,
    TextLink { url: String },
    Other,
}

impl Entity {
    /// Byte range of this entity inside `text`, or `None` if it doesn't line up.
    pub fn byte_range(&self, text: &str) -> Option<Range<usize>> {
        let start = utf16_to_byte(text, self.offset)?;
        let end = utf16_to_byte(text, self.offset + self.length)?;
        Some(start..end)
    }

    pub fn text<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.byte_range(text).map(|r| &text[r])
    }
}

fn utf16_to_byte(text: &str, utf16_pos: usize) -> Option<usize> {
    let mut units = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        if units == utf16_pos {
            return Some(byte_idx);
        }
        units += ch.len_utf16();
        if units > utf16_pos {
            // Position falls inside a surrogate pair.
            return None;
        }
    }
    (units == utf16_pos).then_some(text.len())
}

/// Inline keyboard: rows of callback buttons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(offset: usize, length: usize) -> Entity {
        Entity {
            kind: EntityKind::Mention,
            offset,
            length,
        }
    }

    #[test]
    fn ascii_offsets_map_directly() {
        let text = "hi @bob!";
        assert_eq!(entity(3, 4).text(text), Some("@bob"));
    }

    #[test]
    fn utf16_offsets_account_for_wide_chars() {
        // "🎁" is two UTF-16 units and four bytes; "ї" is one unit and two bytes.
        let text = "🎁 ї @anna";
        assert_eq!(entity(5, 5).text(text), Some("@anna"));
    }

    #[test]
    fn misaligned_entity_is_rejected() {
        let text = "🎁x";
        assert_eq!(entity(1, 1).text(text), None);
        assert_eq!(entity(0, 9).text(text), None);
    }

    #[test]
    fn keyboard_layouts() {
        let a = InlineButton::new("a", "x:1");
        let b = InlineButton::new("b", "x:2");
        let row = InlineKeyboard::single_row(vec![a.clone(), b.clone()]);
        let col = InlineKeyboard::one_per_row(vec![a, b]);
        assert_eq!(row.rows.len(), 1);
        assert_eq!(col.rows.len(), 2);
        assert_eq!(row.buttons().count(), col.buttons().count());
    }
}
