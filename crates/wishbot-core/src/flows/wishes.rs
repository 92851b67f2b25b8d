//! Adding, viewing and deleting wishes.

use std::collections::BTreeMap;

use crate::{
    callback::Callback,
    confirm::{request_confirmation, ConfirmAction},
    domain::{ActingUser, GroupId, UserId, WishId},
    errors::{Denial, Error},
    formatting::{at_username, wish_body},
    messaging::types::{Entity, EntityKind, InlineButton, InlineKeyboard, TextMessage},
    store::{NewWish, Wish},
    texts::Text,
    Result,
};

use super::Services;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WishDetails {
    pub url: String,
    pub description: String,
}

/// The first URL or text link defines the wish; the text after it is the description.
pub fn parse_details(text: &str, entities: &[Entity]) -> Option<WishDetails> {
    entities.iter().find_map(|e| {
        let range = e.byte_range(text)?;
        let url = match &e.kind {
            EntityKind::Url => text[range.clone()].to_string(),
            EntityKind::TextLink { url } => url.clone(),
            _ => return None,
        };
        Some(WishDetails {
            url,
            description: text[range.end..].trim().to_string(),
        })
    })
}

/// `/addwish`.
pub async fn command(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_user_groups(me.id).await?;
    let chosen = svc
        .choose_group(me, groups, Text::NoGroups, Text::AddWishMenu, |group_id| {
            Callback::AddWish { group_id }
        })
        .await?;
    match chosen {
        Some(group) => start(svc, me, group.id).await,
        None => Ok(()),
    }
}

/// Add-wish button: members only, then wait for the link.
pub async fn start(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_member(&group, me.id).await?;

    svc.flows.set_wish_creation(me.id, group_id);
    let html = format!(
        "{}\n\n{}",
        Text::LetsAddWish {
            group_name: group.name
        }
        .render(me.language),
        Text::SendWishData.render(me.language)
    );
    svc.say_html(me, &html).await?;
    Ok(())
}

/// Free text while awaiting wish details. Without a link the flow stays active.
pub async fn on_details(
    svc: &Services,
    me: &ActingUser,
    group_id: GroupId,
    msg: &TextMessage,
) -> Result<()> {
    let Some(details) = parse_details(&msg.text, &msg.entities) else {
        svc.say(me, Text::ErrorNoUrl).await?;
        return Ok(());
    };
    svc.flows.release(me.id);

    let group = svc.store.get_group(group_id).await?;
    let wish = svc
        .store
        .create_wish(NewWish {
            group_id,
            user_id: me.id,
            url: details.url,
            description: details.description,
        })
        .await?;
    tracing::info!(
        user_id = me.id.0,
        group_id = group_id.0,
        wish_id = wish.id.0,
        "wish created"
    );
    svc.say(me, Text::WishCreated).await?;

    let others: Vec<UserId> = match svc.store.get_group_members(group_id).await {
        Ok(members) => members
            .into_iter()
            .map(|m| m.user_id)
            .filter(|id| *id != me.id)
            .collect(),
        Err(e) => {
            tracing::error!(group_id = group_id.0, error = %e, "could not load members to notify");
            svc.say(me, Text::ErrorWishGroupNotification).await?;
            return Ok(());
        }
    };
    svc.notifier.notify_all(
        others,
        &Text::WishCreatedGroupNotification {
            name: me.display_name().to_string(),
            group_name: group.name,
        },
        Some(&wish_body(&wish.url, &wish.description)),
    );
    Ok(())
}

/// `/wishes`.
pub async fn display_command(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_user_groups(me.id).await?;
    let chosen = svc
        .choose_group(me, groups, Text::NoGroups, Text::ViewWishesMenu, |group_id| {
            Callback::DisplayWishes { group_id }
        })
        .await?;
    match chosen {
        Some(group) => display(svc, me, group.id).await,
        None => Ok(()),
    }
}

/// One message per author, authors in order of their first wish.
pub async fn display(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_member(&group, me.id).await?;

    let wishes = svc.store.get_group_wishes(group_id).await?;
    if wishes.is_empty() {
        svc.say(
            me,
            Text::NoWishes {
                group_name: group.name,
            },
        )
        .await?;
        return Ok(());
    }

    svc.say(
        me,
        Text::HereAreWishes {
            group_name: group.name,
        },
    )
    .await?;

    let mut order: Vec<UserId> = Vec::new();
    let mut by_author: BTreeMap<UserId, Vec<Wish>> = BTreeMap::new();
    for wish in wishes {
        if !by_author.contains_key(&wish.user_id) {
            order.push(wish.user_id);
        }
        by_author.entry(wish.user_id).or_default().push(wish);
    }

    for author in order {
        let header = if author == me.id {
            Text::YourWishes
        } else {
            let user = svc.store.get_user(author).await?;
            Text::UserWishes {
                username: at_username(user.username.as_deref()),
            }
        };
        let bodies: Vec<String> = by_author
            .remove(&author)
            .unwrap_or_default()
            .iter()
            .map(|w| wish_body(&w.url, &w.description))
            .collect();
        let html = format!("{}\n\n{}", header.render(me.language), bodies.join("\n\n"));
        svc.say_html(me, &html).await?;
    }
    Ok(())
}

/// `/managewishes`.
pub async fn manage_command(svc: &Services, me: &ActingUser) -> Result<()> {
    let groups = svc.store.get_user_groups(me.id).await?;
    let chosen = svc
        .choose_group(me, groups, Text::NoGroups, Text::ManageWishesMenu, |group_id| {
            Callback::ManageWishes { group_id }
        })
        .await?;
    match chosen {
        Some(group) => manage(svc, me, group.id).await,
        None => Ok(()),
    }
}

/// The user's own wishes in the group, each with a Delete button.
pub async fn manage(svc: &Services, me: &ActingUser, group_id: GroupId) -> Result<()> {
    let group = svc.store.get_group(group_id).await?;
    svc.require_member(&group, me.id).await?;

    let wishes = svc.store.get_user_wishes(me.id, group_id).await?;
    if wishes.is_empty() {
        svc.say(
            me,
            Text::NoWishes {
                group_name: group.name,
            },
        )
        .await?;
        return Ok(());
    }

    svc.say(
        me,
        Text::HereAreYourWishes {
            group_name: group.name,
        },
    )
    .await?;
    for wish in wishes {
        let delete = Callback::DeleteWish { wish_id: wish.id };
        svc.say_with_keyboard(
            me,
            &wish_body(&wish.url, &wish.description),
            InlineKeyboard::single_row(vec![InlineButton::new(
                Text::Delete.render(me.language),
                delete.encode(),
            )]),
        )
        .await?;
    }
    Ok(())
}

fn require_author(wish: &Wish, user_id: UserId) -> Result<()> {
    if wish.user_id == user_id {
        Ok(())
    } else {
        Err(Error::PermissionDenied(Denial::NotWishAuthor))
    }
}

/// Delete button: author only, asks for confirmation.
pub async fn ask_delete(svc: &Services, me: &ActingUser, wish_id: WishId) -> Result<()> {
    let wish = svc.store.get_wish(wish_id).await?;
    require_author(&wish, me.id)?;

    let shown = if wish.description.is_empty() {
        wish.url
    } else {
        format!("{}\n{}", wish.url, wish.description)
    };
    request_confirmation(
        svc.messenger.as_ref(),
        me.chat_id,
        me.language,
        Text::DeleteWish { wish: shown },
        ConfirmAction::DeleteWish { wish_id },
    )
    .await?;
    Ok(())
}

/// Confirmed delete.
pub async fn delete(svc: &Services, me: &ActingUser, wish_id: WishId) -> Result<()> {
    let wish = svc.store.get_wish(wish_id).await?;
    require_author(&wish, me.id)?;

    svc.store.delete_wish(wish_id).await?;
    tracing::info!(user_id = me.id.0, wish_id = wish_id.0, "wish deleted");
    svc.say(me, Text::WishDeleted).await?;
    Ok(())
}
