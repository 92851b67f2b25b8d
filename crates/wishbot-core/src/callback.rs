//! Callback token codec.
//!
//! Inline buttons carry a compact ASCII token `<prefix><field>:<field>:...` where the
//! prefix names the action family and already ends with the delimiter. Each prefix has
//! a fixed schema (ordered, typed fields) checked at decode time, so a stale or foreign
//! token is rejected instead of being misparsed.

use std::fmt::Display;

use crate::domain::{GroupId, UserId, WishId};

pub const DELIM: char = ':';

/// Telegram rejects `callback_data` longer than this (bytes).
pub const MAX_TOKEN_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("token has no prefix delimiter: {0:?}")]
    MissingDelimiter(String),

    #[error("unknown token prefix: {0:?}")]
    UnknownPrefix(String),

    #[error("expected {expected} field(s), got {got}")]
    FieldCount { expected: usize, got: usize },

    #[error("field is not a number: {0:?}")]
    InvalidNumber(String),

    #[error("unknown confirmation action kind: {0}")]
    UnknownActionKind(i64),
}

/// Action families, one per button prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prefix {
    InviteMember,
    AcceptInvite,
    RejectInvite,
    AddWish,
    DisplayWishes,
    LeaveGroup,
    ManageWishes,
    ManageMembers,
    DeleteWish,
    KickMember,
    ConfirmYes,
    ConfirmNo,
}

impl Prefix {
    pub const ALL: [Prefix; 12] = [
        Prefix::InviteMember,
        Prefix::AcceptInvite,
        Prefix::RejectInvite,
        Prefix::AddWish,
        Prefix::DisplayWishes,
        Prefix::LeaveGroup,
        Prefix::ManageWishes,
        Prefix::ManageMembers,
        Prefix::DeleteWish,
        Prefix::KickMember,
        Prefix::ConfirmYes,
        Prefix::ConfirmNo,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Prefix::InviteMember => "invite_member:",
            Prefix::AcceptInvite => "accept_invite:",
            Prefix::RejectInvite => "reject_invite:",
            Prefix::AddWish => "add_wish:",
            Prefix::DisplayWishes => "display_wishes:",
            Prefix::LeaveGroup => "leave_group:",
            Prefix::ManageWishes => "manage_wishes:",
            Prefix::ManageMembers => "manage_members:",
            Prefix::DeleteWish => "delete_wish:",
            Prefix::KickMember => "kick_member:",
            Prefix::ConfirmYes => "surey:",
            Prefix::ConfirmNo => "suren:",
        }
    }

    pub fn lookup(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == raw)
    }
}

/// Join `prefix` with `fields`. Fields must not contain [`DELIM`]; only numeric ids
/// are ever embedded.
pub fn encode<I, T>(prefix: Prefix, fields: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let mut out = prefix.as_str().to_string();
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            out.push(DELIM);
        }
        out.push_str(&field.to_string());
    }
    out
}

/// Split a token at its first delimiter: `(prefix, remainder)`.
pub fn decode(token: &str) -> Result<(Prefix, &str), DecodeError> {
    let Some(idx) = token.find(DELIM) else {
        return Err(DecodeError::MissingDelimiter(token.to_string()));
    };
    let (raw_prefix, rest) = token.split_at(idx + DELIM.len_utf8());
    let prefix = Prefix::lookup(raw_prefix)
        .ok_or_else(|| DecodeError::UnknownPrefix(raw_prefix.to_string()))?;
    Ok((prefix, rest))
}

/// Parse exactly `N` delimiter-joined integers.
pub fn parse_ids<const N: usize>(payload: &str) -> Result<[i64; N], DecodeError> {
    if N == 0 {
        return if payload.is_empty() {
            Ok([0; N])
        } else {
            Err(DecodeError::FieldCount {
                expected: 0,
                got: payload.split(DELIM).count(),
            })
        };
    }

    let parts: Vec<&str> = payload.split(DELIM).collect();
    if parts.len() != N {
        return Err(DecodeError::FieldCount {
            expected: N,
            got: parts.len(),
        });
    }

    let mut out = [0i64; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidNumber(part.to_string()))?;
    }
    Ok(out)
}

/// Every button the bot emits, with its typed payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callback {
    InviteMember { group_id: GroupId },
    AcceptInvite { inviter_id: UserId, group_id: GroupId },
    RejectInvite { inviter_id: UserId, group_id: GroupId },
    AddWish { group_id: GroupId },
    DisplayWishes { group_id: GroupId },
    LeaveGroup { group_id: GroupId },
    ManageWishes { group_id: GroupId },
    ManageMembers { group_id: GroupId },
    DeleteWish { wish_id: WishId },
    KickMember { user_id: UserId, group_id: GroupId },
    /// Raw `<kind>:<payload>` suffix; parsed by the confirmation workflow.
    ConfirmYes { payload: String },
    ConfirmNo,
}

impl Callback {
    pub fn prefix(&self) -> Prefix {
        match self {
            Callback::InviteMember { .. } => Prefix::InviteMember,
            Callback::AcceptInvite { .. } => Prefix::AcceptInvite,
            Callback::RejectInvite { .. } => Prefix::RejectInvite,
            Callback::AddWish { .. } => Prefix::AddWish,
            Callback::DisplayWishes { .. } => Prefix::DisplayWishes,
            Callback::LeaveGroup { .. } => Prefix::LeaveGroup,
            Callback::ManageWishes { .. } => Prefix::ManageWishes,
            Callback::ManageMembers { .. } => Prefix::ManageMembers,
            Callback::DeleteWish { .. } => Prefix::DeleteWish,
            Callback::KickMember { .. } => Prefix::KickMember,
            Callback::ConfirmYes { .. } => Prefix::ConfirmYes,
            Callback::ConfirmNo => Prefix::ConfirmNo,
        }
    }

    pub fn encode(&self) -> String {
        let prefix = self.prefix();
        match self {
            Callback::InviteMember { group_id }
            | Callback::AddWish { group_id }
            | Callback::DisplayWishes { group_id }
            | Callback::LeaveGroup { group_id }
            | Callback::ManageWishes { group_id }
            | Callback::ManageMembers { group_id } => encode(prefix, [group_id.0]),
            Callback::AcceptInvite {
                inviter_id,
                group_id,
            }
            | Callback::RejectInvite {
                inviter_id,
                group_id,
            } => encode(prefix, [inviter_id.0, group_id.0]),
            Callback::DeleteWish { wish_id } => encode(prefix, [wish_id.0]),
            Callback::KickMember { user_id, group_id } => encode(prefix, [user_id.0, group_id.0]),
            Callback::ConfirmYes { payload } => encode(prefix, [payload]),
            Callback::ConfirmNo => encode(prefix, std::iter::empty::<i64>()),
        }
    }

    pub fn decode(token: &str) -> Result<Self, DecodeError> {
        let (prefix, rest) = decode(token)?;
        let group = |rest: &str| parse_ids::<1>(rest).map(|[g]| GroupId(g));
        let pair = |rest: &str| parse_ids::<2>(rest);

        Ok(match prefix {
            Prefix::InviteMember => Callback::InviteMember {
                group_id: group(rest)?,
            },
            Prefix::AcceptInvite => {
                let [inviter, group_id] = pair(rest)?;
                Callback::AcceptInvite {
                    inviter_id: UserId(inviter),
                    group_id: GroupId(group_id),
                }
            }
            Prefix::RejectInvite => {
                let [inviter, group_id] = pair(rest)?;
                Callback::RejectInvite {
                    inviter_id: UserId(inviter),
                    group_id: GroupId(group_id),
                }
            }
            Prefix::AddWish => Callback::AddWish {
                group_id: group(rest)?,
            },
            Prefix::DisplayWishes => Callback::DisplayWishes {
                group_id: group(rest)?,
            },
            Prefix::LeaveGroup => Callback::LeaveGroup {
                group_id: group(rest)?,
            },
            Prefix::ManageWishes => Callback::ManageWishes {
                group_id: group(rest)?,
            },
            Prefix::ManageMembers => Callback::ManageMembers {
                group_id: group(rest)?,
            },
            Prefix::DeleteWish => {
                let [wish] = parse_ids::<1>(rest)?;
                Callback::DeleteWish {
                    wish_id: WishId(wish),
                }
            }
            Prefix::KickMember => {
                let [user, group_id] = pair(rest)?;
                Callback::KickMember {
                    user_id: UserId(user),
                    group_id: GroupId(group_id),
                }
            }
            Prefix::ConfirmYes => Callback::ConfirmYes {
                payload: rest.to_string(),
            },
            Prefix::ConfirmNo => {
                parse_ids::<0>(rest)?;
                Callback::ConfirmNo
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_unique_and_end_with_single_delimiter() {
        for p in Prefix::ALL {
            let s = p.as_str();
            assert!(s.ends_with(DELIM));
            assert_eq!(s.matches(DELIM).count(), 1, "{s}");
            assert_eq!(Prefix::lookup(s), Some(p));
        }
        let mut all: Vec<&str> = Prefix::ALL.iter().map(|p| p.as_str()).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), Prefix::ALL.len());
    }

    #[test]
    fn encode_then_decode_yields_prefix_and_fields() {
        let token = encode(Prefix::KickMember, [123_i64, -456]);
        assert_eq!(token, "kick_member:123:-456");

        let (prefix, rest) = decode(&token).unwrap();
        assert_eq!(prefix, Prefix::KickMember);
        assert_eq!(parse_ids::<2>(rest).unwrap(), [123, -456]);
    }

    #[test]
    fn decode_rejects_unknown_prefix_and_missing_delimiter() {
        assert_eq!(
            decode("bogus:1").unwrap_err(),
            DecodeError::UnknownPrefix("bogus:".to_string())
        );
        assert!(matches!(
            decode("nodelimiter"),
            Err(DecodeError::MissingDelimiter(_))
        ));
    }

    #[test]
    fn parse_ids_validates_count_and_type() {
        assert_eq!(
            parse_ids::<2>("1").unwrap_err(),
            DecodeError::FieldCount {
                expected: 2,
                got: 1
            }
        );
        assert_eq!(
            parse_ids::<1>("abc").unwrap_err(),
            DecodeError::InvalidNumber("abc".to_string())
        );
        assert!(parse_ids::<1>("").is_err());
        assert!(parse_ids::<0>("").is_ok());
        assert!(parse_ids::<0>("5").is_err());
    }

    #[test]
    fn typed_callbacks_survive_the_wire() {
        let cases = [
            Callback::InviteMember {
                group_id: GroupId(7),
            },
            Callback::AcceptInvite {
                inviter_id: UserId(11),
                group_id: GroupId(7),
            },
            Callback::DeleteWish {
                wish_id: WishId(42),
            },
            Callback::ConfirmYes {
                payload: "1:42".to_string(),
            },
            Callback::ConfirmNo,
        ];
        for cb in cases {
            assert_eq!(Callback::decode(&cb.encode()).unwrap(), cb);
        }
    }

    #[test]
    fn no_button_carries_no_payload() {
        assert_eq!(Callback::ConfirmNo.encode(), "suren:");
        assert!(Callback::decode("suren:9").is_err());
    }

    #[test]
    fn extreme_ids_fit_button_limit() {
        let tokens = [
            Callback::AcceptInvite {
                inviter_id: UserId(i64::MIN),
                group_id: GroupId(i64::MIN),
            }
            .encode(),
            Callback::KickMember {
                user_id: UserId(i64::MIN),
                group_id: GroupId(i64::MIN),
            }
            .encode(),
            Callback::ConfirmYes {
                payload: format!("2:{}:{}", i64::MIN, i64::MIN),
            }
            .encode(),
        ];
        for t in tokens {
            assert!(t.len() <= MAX_TOKEN_LEN, "{t} is {} bytes", t.len());
        }
    }

    #[test]
    fn wrong_shape_for_known_prefix_is_rejected() {
        assert!(Callback::decode("accept_invite:1").is_err());
        assert!(Callback::decode("delete_wish:1:2").is_err());
        assert!(Callback::decode("add_wish:x").is_err());
    }
}
