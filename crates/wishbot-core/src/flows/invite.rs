//! Inviting people into a group and answering invites.

use crate::{
    callback::Callback,
    domain::{ActingUser, GroupId, UserId},
    errors::Error,
    formatting::at_username,
    messaging::types::{Entity, EntityKind, InlineButton, InlineKeyboard, TextMessage},
    store::{Group, User},
    texts::Text,
    Result,
};

use super::Services;

/// A user reference found in invite text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mention {
    /// `@name` typed in the text (without the `@`).
    Username(String),
    /// A user the platform resolved for us.
    User { user_id: UserId, first_name: String },
}

impl Mention {
    fn label(&self) -> String {
        match self {
            Mention::Username(name) => format!("@{name}"),
            Mention::User { first_name, .. } => first_name.clone(),
        }
    }
}

/// Mentions in message order. Entities that don't line up with the text are skipped.
pub fn extract_mentions(text: &str, entities: &[Entity]) -> Vec<Mention> {
    entities
        .iter()
        .filter_map(|e| match &e.kind {
            EntityKind::Mention => e
                .text(text)
                .map(|t| Mention::Username(t.trim_start_matches('@').to_string())),
            EntityKind::TextMention {
                user_id,
                first_name,
            } => Some(Mention::User {
                user_id: *user_id,
                first_name: first_name.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// `/addmember`: owned groups only.
pub async fn command(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_owned_groups(me.id).await?;
    let chosen = svc
        .choose_group(
            me,
            groups,
            Text::NoOwnedGroups,
            Text::InviteMemberMenu,
            |group_id| Callback::InviteMember { group_id },
        )
        .await?;
    match chosen {
        Some(group) => start(svc, me, group.id).await,
        None => Ok(()),
    }
}

/// Invite-member button: wait for mentions.
pub async fn start(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_owner(&group, me.id)?;

    svc.flows.set_invite_creation(me.id, group_id);
    svc.say(
        me,
        Text::MentionToInvite {
            group_name: group.name,
        },
    )
    .await?;
    Ok(())
}

/// Free text while awaiting invitees. Each mention is handled on its own; the flow
/// ends once the message has been processed, whatever the individual outcomes.
pub async fn on_mentions(
    svc: &Services,
    me: &ActingUser,
    group_id: GroupId,
    msg: &TextMessage,
) -> Result<()> {
    let mentions = extract_mentions(&msg.text, &msg.entities);
    if mentions.is_empty() {
        svc.say(me, Text::MentionOneUser).await?;
        return Ok(());
    }
    svc.flows.release(me.id);

    let group = svc.store.get_group(group_id).await?;
    for mention in mentions {
        if let Err(e) = invite_one(svc, me, &group, &mention).await {
            tracing::error!(
                user_id = me.id.0,
                group_id = group.id.0,
                mention = %mention.label(),
                error = %e,
                "invite failed"
            );
            let reply = Text::ErrorInvitingUser {
                username: mention.label(),
            };
            if let Err(e) = svc.say(me, reply).await {
                tracing::warn!(user_id = me.id.0, error = %e, "could not report failed invite");
            }
        }
    }
    Ok(())
}

async fn resolve(svc: &Services, mention: &Mention) -> Result<User> {
    match mention {
        Mention::Username(name) => svc.store.get_user_by_username(name).await,
        Mention::User { user_id, .. } => svc.store.get_user(*user_id).await,
    }
}

/// One mention's outcome. Errors are reported to the inviter by the caller.
async fn invite_one(
    svc: &Services,
    me: &ActingUser,
    group: &Group,
    mention: &Mention,
) -> Result<()> {
    let invitee = match resolve(svc, mention).await {
        Ok(user) => user,
        Err(Error::NotFound(_)) => {
            svc.say(
                me,
                Text::DidntChatWithUser {
                    name: mention.label(),
                },
            )
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if invitee.id == me.id {
        tracing::info!(user_id = me.id.0, group_id = group.id.0, "self-invite ignored");
        return Ok(());
    }

    let username = invitee
        .username
        .as_deref()
        .map(|u| at_username(Some(u)))
        .unwrap_or_else(|| mention.label());

    if svc.store.is_member(group.id, invitee.id).await? {
        svc.say(me, Text::AlreadyAMember { username }).await?;
        return Ok(());
    }

    let lang = invitee.language;
    let html = Text::GroupInvite {
        group_name: group.name.clone(),
        inviter: me.display_name().to_string(),
    }
    .render(lang);
    let keyboard = InlineKeyboard::single_row(vec![
        InlineButton::new(
            Text::Accept.render(lang),
            Callback::AcceptInvite {
                inviter_id: me.id,
                group_id: group.id,
            }
            .encode(),
        ),
        InlineButton::new(
            Text::Reject.render(lang),
            Callback::RejectInvite {
                inviter_id: me.id,
                group_id: group.id,
            }
            .encode(),
        ),
    ]);

    match svc
        .messenger
        .send_inline_keyboard(invitee.chat_id, &html, keyboard)
        .await
    {
        Ok(_) => {
            tracing::info!(
                user_id = me.id.0,
                invitee = invitee.id.0,
                group_id = group.id.0,
                "invite sent"
            );
            svc.say(me, Text::Invited { username }).await?;
        }
        Err(e) => {
            tracing::error!(
                user_id = me.id.0,
                invitee = invitee.id.0,
                error = %e,
                "invite not delivered"
            );
            svc.say(me, Text::ErrorInvitingUser { username }).await?;
        }
    }
    Ok(())
}

/// Accept button. Joining twice is answered without touching the store.
pub async fn accept(
    svc: &Services,
    me: &ActingUser,
    inviter_id: UserId,
    group_id: GroupId,
) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    if svc.store.is_member(group_id, me.id).await? {
        svc.say(
            me,
            Text::AlreadyInGroup {
                group_name: group.name,
            },
        )
        .await?;
        return Ok(());
    }

    svc.store.create_group_member(group_id, me.id).await?;
    tracing::info!(user_id = me.id.0, group_id = group_id.0, "invite accepted");
    svc.say(me, Text::YouAcceptedInvite).await?;
    svc.notifier.notify(
        inviter_id,
        Text::AcceptedInviteNotification {
            name: me.display_name().to_string(),
            group_name: group.name,
        },
    );
    Ok(())
}

/// Reject button.
pub async fn reject(
    svc: &Services,
    me: &ActingUser,
    inviter_id: UserId,
    group_id: GroupId,
) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    tracing::info!(user_id = me.id.0, group_id = group_id.0, "invite rejected");
    svc.say(me, Text::YouRejectedInvite).await?;
    svc.notifier.notify(
        inviter_id,
        Text::RejectedInviteNotification {
            name: me.display_name().to_string(),
            group_name: group.name,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ChatId,
        errors::Denial,
        flows::testkit::Kit,
        store::DataStore,
    };

    fn mention_entity(text: &str, name: &str) -> Entity {
        let offset = text.find(name).unwrap();
        Entity {
            kind: EntityKind::Mention,
            offset: text[..offset].encode_utf16().count(),
            length: name.encode_utf16().count(),
        }
    }

    fn msg(from: &ActingUser, text: &str, entities: Vec<Entity>) -> TextMessage {
        TextMessage {
            chat_id: from.chat_id,
            from: from.clone(),
            text: text.to_string(),
            entities,
        }
    }

    #[test]
    fn mentions_keep_message_order() {
        let text = "hey @bob and 🎉 @Carol";
        let entities = vec![
            mention_entity(text, "@bob"),
            Entity {
                kind: EntityKind::Url,
                offset: 0,
                length: 3,
            },
            Entity {
                kind: EntityKind::TextMention {
                    user_id: UserId(9),
                    first_name: "Dan".into(),
                },
                offset: 0,
                length: 3,
            },
            mention_entity(text, "@Carol"),
        ];
        assert_eq!(
            extract_mentions(text, &entities),
            vec![
                Mention::Username("bob".into()),
                Mention::User {
                    user_id: UserId(9),
                    first_name: "Dan".into()
                },
                Mention::Username("Carol".into()),
            ]
        );
    }

    #[tokio::test]
    async fn start_requires_ownership() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();

        let err = start(&kit.services, &bob, g.id).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(Denial::NotOwner { .. })));
        assert_eq!(kit.services.flows.current(bob.id), None);
    }

    #[tokio::test]
    async fn mixed_mentions_are_handled_independently() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let carol = kit.user(3, "carol").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();
        kit.services.flows.set_invite_creation(alice.id, g.id);

        let text = "@bob @ghost @carol @alice";
        let entities = vec![
            mention_entity(text, "@bob"),
            mention_entity(text, "@ghost"),
            mention_entity(text, "@carol"),
            mention_entity(text, "@alice"),
        ];
        on_mentions(&kit.services, &alice, g.id, &msg(&alice, text, entities))
            .await
            .unwrap();

        assert_eq!(kit.services.flows.current(alice.id), None);

        let replies = kit.messenger.texts_to(alice.chat_id);
        assert_eq!(replies.len(), 3, "{replies:?}");
        assert!(replies[0].contains("already a member"));
        assert!(replies[1].contains("@ghost hasn't talked to me"));
        assert!(replies[2].contains("Invited @carol"));

        let invite = &kit.messenger.sent_to(carol.chat_id)[0];
        let tokens: Vec<&str> = invite
            .keyboard
            .as_ref()
            .unwrap()
            .buttons()
            .map(|b| b.callback_data.as_str())
            .collect();
        assert_eq!(
            tokens,
            vec![
                format!("accept_invite:1:{}", g.id.0),
                format!("reject_invite:1:{}", g.id.0)
            ]
        );
        assert!(kit.messenger.sent_to(bob.chat_id).is_empty());
    }

    #[tokio::test]
    async fn text_without_mentions_keeps_the_flow() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.services.flows.set_invite_creation(alice.id, g.id);

        on_mentions(&kit.services, &alice, g.id, &msg(&alice, "bob please", vec![]))
            .await
            .unwrap();

        assert_eq!(kit.services.flows.invite_group_id(alice.id), Some(g.id));
        assert_eq!(
            kit.messenger.texts_to(alice.chat_id),
            vec![Text::MentionOneUser.render(alice.language)]
        );
    }

    #[tokio::test]
    async fn failed_delivery_is_reported_per_invitee() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.messenger.fail_sends_to(ChatId(20));

        let text = "@bob";
        on_mentions(
            &kit.services,
            &alice,
            g.id,
            &msg(&alice, text, vec![mention_entity(text, "@bob")]),
        )
        .await
        .unwrap();
        assert!(kit.messenger.texts_to(alice.chat_id)[0].contains("Could not invite @bob"));
    }

    #[tokio::test]
    async fn store_failure_for_one_invitee_does_not_stop_the_rest() {
        let (kit, flaky) = Kit::flaky();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let carol = kit.user(3, "carol").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        flaky.break_user(bob.id);

        let text = "@bob @carol";
        let entities = vec![mention_entity(text, "@bob"), mention_entity(text, "@carol")];
        on_mentions(&kit.services, &alice, g.id, &msg(&alice, text, entities))
            .await
            .unwrap();

        let replies = kit.messenger.texts_to(alice.chat_id);
        assert_eq!(replies.len(), 2, "{replies:?}");
        assert!(replies[0].contains("Could not invite @bob"));
        assert!(replies[1].contains("Invited @carol"));
        assert_eq!(kit.messenger.sent_to(carol.chat_id).len(), 1);
        assert!(kit.messenger.sent_to(bob.chat_id).is_empty());
    }

    #[tokio::test]
    async fn accept_joins_and_notifies_inviter() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();

        accept(&kit.services, &bob, alice.id, g.id).await.unwrap();
        kit.settle().await;

        assert!(kit.store.is_member(g.id, bob.id).await.unwrap());
        assert!(kit.messenger.texts_to(alice.chat_id)[0].contains("bob accepted"));

        // A second press doesn't fail on the duplicate membership.
        accept(&kit.services, &bob, alice.id, g.id).await.unwrap();
        assert!(kit.messenger.texts_to(bob.chat_id)[1].contains("already in"));
    }

    #[tokio::test]
    async fn reject_only_notifies() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();

        reject(&kit.services, &bob, alice.id, g.id).await.unwrap();
        kit.settle().await;

        assert!(!kit.store.is_member(g.id, bob.id).await.unwrap());
        assert!(kit.messenger.texts_to(alice.chat_id)[0].contains("bob rejected"));
    }
}
