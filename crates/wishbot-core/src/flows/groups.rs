//! Group creation, listing, leaving and member management.

use crate::{
    callback::Callback,
    confirm::{request_confirmation, ConfirmAction},
    domain::{ActingUser, GroupId, UserId},
    formatting::at_username,
    messaging::types::{InlineButton, InlineKeyboard},
    texts::Text,
    Result,
};

use super::Services;

/// `/creategroup`: wait for the group name.
pub async fn start_creation(svc: &Services, me: &ActingUser) -> Result<()> {
    svc.flows.set_group_creation(me.id);
    svc.say(me, Text::SendGroupName).await?;
    Ok(())
}

/// Free text while awaiting a group name: the text is the name, verbatim.
/// The flow ends before the store is touched, so a failed insert doesn't trap the user.
pub async fn on_group_name(svc: &Services, me: &ActingUser, name: &str) -> Result<()> {
    svc.flows.release(me.id);
    let group = svc.store.create_group(me.id, name).await?;
    tracing::info!(user_id = me.id.0, group_id = group.id.0, "group created");

    let html = format!(
        "{}\n\n{}",
        Text::GroupCreated {
            group_name: group.name
        }
        .render(me.language),
        Text::CanAddMembers.render(me.language)
    );
    svc.say_html(me, &html).await?;
    Ok(())
}

/// `/mygroups`: one message per group with its members, owner starred.
pub async fn list_groups(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_user_groups(me.id).await?;
    if groups.is_empty() {
        svc.say(me, Text::NoGroups).await?;
        return Ok(());
    }

    svc.say(me, Text::YourGroups).await?;
    for group in groups {
        let members = svc.store.get_group_members(group.id).await?;
        let mut lines = Vec::with_capacity(members.len());
        for m in &members {
            let user = svc.store.get_user(m.user_id).await?;
            let mut line = at_username(user.username.as_deref());
            if m.user_id == group.owner_id {
                line.push_str(" ⭐");
            }
            lines.push(line);
        }
        let text = Text::GroupEntry {
            group_name: group.name,
            member_count: members.len(),
            members: lines.join("\n"),
        };
        svc.say(me, text).await?;
    }
    Ok(())
}

/// `/leavegroup`.
pub async fn leave_command(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_user_groups(me.id).await?;
    let chosen = svc
        .choose_group(me, groups, Text::NoGroups, Text::LeaveGroupMenu, |group_id| {
            Callback::LeaveGroup { group_id }
        })
        .await?;
    match chosen {
        Some(group) => ask_leave(svc, me, group.id).await,
        None => Ok(()),
    }
}

/// Leave-group button: ask for confirmation, warning owners that the group goes away.
pub async fn ask_leave(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_member(&group, me.id).await?;

    let prompt = if group.owner_id == me.id {
        Text::LeaveOwnedGroup {
            group_name: group.name,
        }
    } else {
        Text::LeaveGroup {
            group_name: group.name,
        }
    };
    request_confirmation(
        svc.messenger.as_ref(),
        me.chat_id,
        me.language,
        prompt,
        ConfirmAction::LeaveGroup { group_id },
    )
    .await?;
    Ok(())
}

/// Confirmed leave. An owner leaving deletes the group.
pub async fn leave(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_member(&group, me.id).await?;

    let others: Vec<UserId> = svc
        .store
        .get_group_members(group_id)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .filter(|id| *id != me.id)
        .collect();

    svc.store.delete_group_member(group_id, me.id).await?;

    if group.owner_id == me.id {
        tracing::info!(user_id = me.id.0, group_id = group_id.0, "owner left; group deleted");
        svc.say(me, Text::GroupDeleted).await?;
        svc.notifier.notify_all(
            others,
            &Text::GroupDeletedNotification {
                group_name: group.name,
            },
            None,
        );
    } else {
        tracing::info!(user_id = me.id.0, group_id = group_id.0, "member left group");
        svc.say(
            me,
            Text::YouLeftGroup {
                group_name: group.name.clone(),
            },
        )
        .await?;
        svc.notifier.notify_all(
            others,
            &Text::UserLeftGroupNotification {
                name: me.display_name().to_string(),
                group_name: group.name,
            },
            None,
        );
    }
    Ok(())
}

/// `/managemembers`: owned groups only.
pub async fn manage_members_command(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_owned_groups(me.id).await?;
    let chosen = svc
        .choose_group(
            me,
            groups,
            Text::NoOwnedGroups,
            Text::ManageMembersMenu,
            |group_id| Callback::ManageMembers { group_id },
        )
        .await?;
    match chosen {
        Some(group) => show_members(svc, me, group.id).await,
        None => Ok(()),
    }
}

/// Every member except the owner, with wish count and a Kick button.
pub async fn show_members(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_owner(&group, me.id)?;

    let members: Vec<UserId> = svc
        .store
        .get_group_members(group_id)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .filter(|id| *id != me.id)
        .collect();
    if members.is_empty() {
        svc.say(
            me,
            Text::NoMembers {
                group_name: group.name,
            },
        )
        .await?;
        return Ok(());
    }

    svc.say(
        me,
        Text::HereAreMembers {
            group_name: group.name,
        },
    )
    .await?;
    for user_id in members {
        let user = svc.store.get_user(user_id).await?;
        let wish_count = svc.store.get_user_wishes(user_id, group_id).await?.len();
        let text = Text::MemberDisplay {
            username: at_username(user.username.as_deref()),
            wish_count,
        };
        let kick = Callback::KickMember { user_id, group_id };
        svc.say_with_keyboard(
            me,
            &text.render(me.language),
            InlineKeyboard::single_row(vec![InlineButton::new(
                Text::Kick.render(me.language),
                kick.encode(),
            )]),
        )
        .await?;
    }
    Ok(())
}

/// Kick button: owner-only, asks for confirmation.
pub async fn ask_kick(
    svc: &Services,
    me: &ActingUser,
    user_id: UserId,
    group_id: GroupId,
) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_owner(&group, me.id)?;
    let user = svc.store.get_user(user_id).await?;

    request_confirmation(
        svc.messenger.as_ref(),
        me.chat_id,
        me.language,
        Text::KickMember {
            username: at_username(user.username.as_deref()),
            group_name: group.name,
        },
        ConfirmAction::KickMember { user_id, group_id },
    )
    .await?;
    Ok(())
}

/// Confirmed kick. The kicked user is told about it.
pub async fn kick(
    svc: &Services,
    me: &ActingUser,
    user_id: UserId,
    group_id: GroupId,
) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_owner(&group, me.id)?;
    if user_id == me.id {
        tracing::info!(
            user_id = me.id.0,
            group_id = group_id.0,
            "owner tried to kick themselves; ignored"
        );
        return Ok(());
    }

    let user = svc.store.get_user(user_id).await?;
    svc.store.delete_group_member(group_id, user_id).await?;
    tracing::info!(
        user_id = me.id.0,
        kicked = user_id.0,
        group_id = group_id.0,
        "member kicked"
    );

    svc.say(
        me,
        Text::YouKickedMember {
            username: at_username(user.username.as_deref()),
            group_name: group.name.clone(),
        },
    )
    .await?;
    svc.notifier.notify(
        user_id,
        Text::YouWereKicked {
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
        errors::{Denial, Error},
        flows::testkit::Kit,
        store::{DataStore, NewWish},
    };

    #[tokio::test]
    async fn group_name_creates_group_and_releases_flow() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;

        start_creation(&kit.services, &alice).await.unwrap();
        assert!(kit.services.flows.is_group_creation(alice.id));

        on_group_name(&kit.services, &alice, "Birthday").await.unwrap();
        assert_eq!(kit.services.flows.current(alice.id), None);

        let groups = kit.store.get_user_groups(alice.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Birthday");
        assert_eq!(groups[0].owner_id, alice.id);
        assert_eq!(kit.store.get_group_members(groups[0].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_insert_still_ends_the_flow() {
        let (kit, flaky) = Kit::flaky();
        let alice = kit.user(1, "alice").await;
        flaky.break_user(alice.id);
        kit.services.flows.set_group_creation(alice.id);

        let err = on_group_name(&kit.services, &alice, "Birthday")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(kit.services.flows.current(alice.id), None);
        assert!(kit.store.get_user_groups(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mygroups_stars_the_owner() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, UserId(2)).await.unwrap();

        list_groups(&kit.services, &alice).await.unwrap();
        let texts = kit.messenger.texts_to(alice.chat_id);
        assert_eq!(texts.len(), 2);
        assert!(texts[1].contains("@alice ⭐"), "{}", texts[1]);
        assert!(texts[1].contains("@bob"));
        assert!(texts[1].contains("2 members"));
    }

    #[tokio::test]
    async fn leave_command_with_several_groups_sends_menu() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let a = kit.store.create_group(alice.id, "A").await.unwrap();
        let b = kit.store.create_group(alice.id, "B").await.unwrap();

        leave_command(&kit.services, &alice).await.unwrap();
        let sent = kit.messenger.sent();
        let tokens: Vec<String> = sent[0]
            .keyboard
            .as_ref()
            .unwrap()
            .buttons()
            .map(|b| b.callback_data.clone())
            .collect();
        assert_eq!(
            tokens,
            vec![
                format!("leave_group:{}", a.id.0),
                format!("leave_group:{}", b.id.0)
            ]
        );
    }

    #[tokio::test]
    async fn member_leaving_notifies_the_rest() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let carol = kit.user(3, "carol").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();
        kit.store.create_group_member(g.id, carol.id).await.unwrap();

        leave(&kit.services, &bob, g.id).await.unwrap();
        kit.settle().await;

        assert!(!kit.store.is_member(g.id, bob.id).await.unwrap());
        assert_eq!(kit.messenger.texts_to(alice.chat_id).len(), 1);
        assert_eq!(kit.messenger.texts_to(carol.chat_id).len(), 1);
        assert!(kit.messenger.texts_to(carol.chat_id)[0].contains("bob left"));
    }

    #[tokio::test]
    async fn owner_leaving_deletes_group() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();

        leave(&kit.services, &alice, g.id).await.unwrap();
        kit.settle().await;

        assert!(matches!(kit.store.get_group(g.id).await, Err(Error::NotFound(_))));
        assert!(kit.messenger.texts_to(bob.chat_id)[0].contains("was deleted"));
    }

    #[tokio::test]
    async fn only_owner_may_manage_or_kick() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();

        let err = show_members(&kit.services, &bob, g.id).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(Denial::NotOwner { .. })));
        let err = kick(&kit.services, &bob, alice.id, g.id).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(Denial::NotOwner { .. })));
    }

    #[tokio::test]
    async fn members_are_listed_with_kick_buttons() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();
        kit.store
            .create_wish(NewWish {
                group_id: g.id,
                user_id: bob.id,
                url: "https://x".into(),
                description: String::new(),
            })
            .await
            .unwrap();

        show_members(&kit.services, &alice, g.id).await.unwrap();
        let sent = kit.messenger.sent_to(alice.chat_id);
        assert_eq!(sent.len(), 2);
        assert!(sent[1].html.contains("@bob"));
        assert!(sent[1].html.contains("Wishes: 1"));
        let token = &sent[1].keyboard.as_ref().unwrap().rows[0][0].callback_data;
        assert_eq!(token, &format!("kick_member:2:{}", g.id.0));
    }

    #[tokio::test]
    async fn kick_removes_member_and_tells_them() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let bob = kit.user(2, "bob").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();
        kit.store.create_group_member(g.id, bob.id).await.unwrap();

        kick(&kit.services, &alice, bob.id, g.id).await.unwrap();
        kit.settle().await;

        assert!(!kit.store.is_member(g.id, bob.id).await.unwrap());
        assert!(kit.messenger.texts_to(ChatId(20))[0].contains("removed from"));
    }

    #[tokio::test]
    async fn kicking_yourself_is_ignored() {
        let kit = Kit::new();
        let alice = kit.user(1, "alice").await;
        let g = kit.store.create_group(alice.id, "Trip").await.unwrap();

        kick(&kit.services, &alice, alice.id, g.id).await.unwrap();
        assert!(kit.store.get_group(g.id).await.is_ok());
        assert!(kit.messenger.sent().is_empty());
    }
}
