//! Generic "are you sure?" wrapper for destructive actions.
//!
//! Nothing is stored server-side: the Yes button's token carries the action kind and
//! its arguments, so the token is the whole pending request.
//!
//! Yes token: `surey:<kind>:<field>[:<field>]`. No token: `suren:`.

use crate::{
    callback::{parse_ids, Callback, DecodeError, DELIM},
    domain::{ChatId, GroupId, MessageRef, UserId, WishId},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard},
    },
    texts::{Lang, Text},
};

/// Wire codes of the confirmable actions. Codes are part of the token format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmKind {
    LeaveGroup,
    DeleteWish,
    KickMember,
}

impl ConfirmKind {
    pub const fn code(self) -> i64 {
        match self {
            ConfirmKind::LeaveGroup => 0,
            ConfirmKind::DeleteWish => 1,
            ConfirmKind::KickMember => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(ConfirmKind::LeaveGroup),
            1 => Ok(ConfirmKind::DeleteWish),
            2 => Ok(ConfirmKind::KickMember),
            other => Err(DecodeError::UnknownActionKind(other)),
        }
    }
}

/// A destructive action waiting for the user's approval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    LeaveGroup { group_id: GroupId },
    DeleteWish { wish_id: WishId },
    KickMember { user_id: UserId, group_id: GroupId },
}

impl ConfirmAction {
    pub fn kind(&self) -> ConfirmKind {
        match self {
            ConfirmAction::LeaveGroup { .. } => ConfirmKind::LeaveGroup,
            ConfirmAction::DeleteWish { .. } => ConfirmKind::DeleteWish,
            ConfirmAction::KickMember { .. } => ConfirmKind::KickMember,
        }
    }

    /// The action's own fields, without the kind.
    pub fn payload(&self) -> String {
        match self {
            ConfirmAction::LeaveGroup { group_id } => group_id.0.to_string(),
            ConfirmAction::DeleteWish { wish_id } => wish_id.0.to_string(),
            ConfirmAction::KickMember { user_id, group_id } => {
                format!("{}{DELIM}{}", user_id.0, group_id.0)
            }
        }
    }

    pub fn yes_callback(&self) -> Callback {
        Callback::ConfirmYes {
            payload: format!("{}{DELIM}{}", self.kind().code(), self.payload()),
        }
    }

    /// Parse the payload of a `ConfirmYes` token (`<kind>:<fields>`).
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let (kind, fields) = raw.split_once(DELIM).unwrap_or((raw, ""));
        let code = kind
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidNumber(kind.to_string()))?;

        Ok(match ConfirmKind::from_code(code)? {
            ConfirmKind::LeaveGroup => {
                let [group_id] = parse_ids::<1>(fields)?;
                ConfirmAction::LeaveGroup {
                    group_id: GroupId(group_id),
                }
            }
            ConfirmKind::DeleteWish => {
                let [wish_id] = parse_ids::<1>(fields)?;
                ConfirmAction::DeleteWish {
                    wish_id: WishId(wish_id),
                }
            }
            ConfirmKind::KickMember => {
                let [user_id, group_id] = parse_ids::<2>(fields)?;
                ConfirmAction::KickMember {
                    user_id: UserId(user_id),
                    group_id: GroupId(group_id),
                }
            }
        })
    }
}

/// Send the Yes/No prompt for `action`.
pub async fn request_confirmation(
    messenger: &dyn MessagingPort,
    chat_id: ChatId,
    lang: Lang,
    prompt: Text,
    action: ConfirmAction,
) -> crate::Result<MessageRef> {
    let html = format!(
        "{}\n\n{}",
        Text::AreYouSure.render(lang),
        prompt.render(lang)
    );
    let keyboard = InlineKeyboard::single_row(vec![
        InlineButton::new(Text::No.render(lang), Callback::ConfirmNo.encode()),
        InlineButton::new(Text::Yes.render(lang), action.yes_callback().encode()),
    ]);
    tracing::debug!(chat_id = chat_id.0, ?action, "requesting confirmation");
    messenger.send_inline_keyboard(chat_id, &html, keyboard).await
}
