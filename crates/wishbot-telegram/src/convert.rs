//! Telegram types → core update model.

use teloxide::types::{CallbackQuery, Message, MessageEntity, MessageEntityKind, User};

use wishbot_core::{
    domain::{ActingUser, ChatId, MessageId, MessageRef, UserId},
    messaging::types::{
        CallbackPress, CommandMessage, Entity, EntityKind, IncomingUpdate, TextMessage,
    },
    texts::Lang,
};

pub fn acting_user(user: &User, chat_id: ChatId) -> ActingUser {
    ActingUser {
        id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        chat_id,
        language: Lang::from_code(user.language_code.as_deref()),
    }
}

pub fn entity(e: &MessageEntity) -> Entity {
    let kind = match &e.kind {
        MessageEntityKind::Mention => EntityKind::Mention,
        MessageEntityKind::TextMention { user } => EntityKind::TextMention {
            user_id: UserId(user.id.0 as i64),
            first_name: user.first_name.clone(),
        },
        MessageEntityKind::Url => EntityKind::Url,
        MessageEntityKind::TextLink { url } => EntityKind::TextLink {
            url: url.to_string(),
        },
        _ => EntityKind::Other,
    };
    Entity {
        kind,
        offset: e.offset,
        length: e.length,
    }
}

/// Text messages only; anything else (stickers, photos, service messages) is `None`.
pub fn message(msg: &Message) -> Option<IncomingUpdate> {
    let user = msg.from()?;
    let text = msg.text()?;
    let chat_id = ChatId(msg.chat.id.0);
    let from = acting_user(user, chat_id);

    if text.starts_with('/') {
        return Some(IncomingUpdate::Command(CommandMessage {
            chat_id,
            from,
            text: text.to_string(),
        }));
    }

    Some(IncomingUpdate::Text(TextMessage {
        chat_id,
        from,
        text: text.to_string(),
        entities: msg
            .entities()
            .map(|es| es.iter().map(entity).collect())
            .unwrap_or_default(),
    }))
}

/// Button presses whose message is gone still get answered, so they are kept; the
/// chat falls back to the user's private chat.
pub fn callback(q: &CallbackQuery) -> IncomingUpdate {
    let message = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });
    let chat_id = message
        .map(|m| m.chat_id)
        .unwrap_or(ChatId(q.from.id.0 as i64));

    IncomingUpdate::Callback(CallbackPress {
        chat_id,
        from: acting_user(&q.from, chat_id),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message,
    })
}
