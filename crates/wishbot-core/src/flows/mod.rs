//! Flow handlers: the multi-step conversations and the actions behind buttons.
//!
//! Every handler reports failures through `Result`; the router turns errors into the
//! single user-facing reply.

use std::sync::Arc;

use crate::{
    callback::Callback,
    domain::{ActingUser, GroupId, MessageRef, UserId},
    errors::{Denial, Error},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard},
    },
    notify::Notifier,
    state::FlowStore,
    store::{DataStore, Group},
    texts::Text,
    Result,
};

pub mod groups;
pub mod invite;
pub mod wishes;

/// Everything a handler may touch.
///
/// `messenger` carries the direct replies to the update being routed. Fan-out to
/// other users goes through `notifier`, which may sit on a slower, rate-limited port.
pub struct Services {
    pub store: Arc<dyn DataStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub flows: FlowStore,
    pub notifier: Notifier,
}

impl Services {
    pub fn new(
        store: Arc<dyn DataStore>,
        messenger: Arc<dyn MessagingPort>,
        notifications: Arc<dyn MessagingPort>,
    ) -> Self {
        let notifier = Notifier::new(Arc::clone(&store), notifications);
        Self {
            store,
            messenger,
            flows: FlowStore::new(),
            notifier,
        }
    }

    /// Reply to the acting user in their language.
    pub async fn say(&self, to: &ActingUser, text: Text) -> Result<MessageRef> {
        self.messenger
            .send_html(to.chat_id, &text.render(to.language))
            .await
    }

    pub async fn say_html(&self, to: &ActingUser, html: &str) -> Result<MessageRef> {
        self.messenger.send_html(to.chat_id, html).await
    }

    pub async fn say_with_keyboard(
        &self,
        to: &ActingUser,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.messenger
            .send_inline_keyboard(to.chat_id, html, keyboard)
            .await
    }

    pub fn require_owner(&self, group: &Group, user_id: UserId) -> Result<()> {
        if group.owner_id == user_id {
            Ok(())
        } else {
            Err(Error::PermissionDenied(Denial::NotOwner {
                group_name: group.name.clone(),
            }))
        }
    }

    pub async fn require_member(&self, group: &Group, user_id: UserId) -> Result<()> {
        if self.store.is_member(group.id, user_id).await? {
            Ok(())
        } else {
            Err(Error::PermissionDenied(Denial::NotMember {
                group_name: group.name.clone(),
            }))
        }
    }

    /// Resolve which group a command applies to.
    ///
    /// No groups: reply `empty`. One group: return it. Several: send a menu whose
    /// buttons carry `to_callback(group_id)` and return `None`.
    pub async fn choose_group(
        &self,
        me: &ActingUser,
        groups: Vec<Group>,
        empty: Text,
        menu: Text,
        to_callback: fn(GroupId) -> Callback,
    ) -> Result<Option<Group>> {
        match groups.len() {
            0 => {
                self.say(me, empty).await?;
                Ok(None)
            }
            1 => Ok(groups.into_iter().next()),
            _ => {
                let buttons = groups
                    .iter()
                    .map(|g| InlineButton::new(g.name.clone(), to_callback(g.id).encode()))
                    .collect();
                self.say_with_keyboard(
                    me,
                    &menu.render(me.language),
                    InlineKeyboard::one_per_row(buttons),
                )
                .await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    //! Wiring for handler and router tests.

    use super::*;
    use crate::{
        domain::ChatId,
        mocks::{FlakyStore, RecordingMessenger},
        store::{MemoryStore, User},
        texts::Lang,
    };

    pub struct Kit {
        pub store: Arc<MemoryStore>,
        pub messenger: Arc<RecordingMessenger>,
        pub services: Services,
    }

    impl Kit {
        pub fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let messenger = Arc::new(RecordingMessenger::default());
            let services = Services::new(store.clone(), messenger.clone(), messenger.clone());
            Self {
                store,
                messenger,
                services,
            }
        }

        /// Like [`Kit::new`], but handlers see the store through a [`FlakyStore`].
        /// `store` still points at the healthy data underneath.
        pub fn flaky() -> (Self, Arc<FlakyStore>) {
            let store = Arc::new(MemoryStore::new());
            let flaky = Arc::new(FlakyStore::new(store.clone()));
            let messenger = Arc::new(RecordingMessenger::default());
            let services = Services::new(flaky.clone(), messenger.clone(), messenger.clone());
            let kit = Self {
                store,
                messenger,
                services,
            };
            (kit, flaky)
        }

        /// Register a user (chat id = id * 10) and return their acting identity.
        pub async fn user(&self, id: i64, username: &str) -> ActingUser {
            let me = acting(id, username);
            self.store
                .create_user(&User {
                    id: me.id,
                    username: me.username.clone(),
                    chat_id: me.chat_id,
                    language: me.language,
                })
                .await
                .unwrap();
            me
        }

        pub async fn settle(&self) {
            self.services.notifier.settle().await;
        }
    }

    pub fn acting(id: i64, username: &str) -> ActingUser {
        ActingUser {
            id: UserId(id),
            username: Some(username.to_string()),
            first_name: username.to_string(),
            chat_id: ChatId(id * 10),
            language: Lang::En,
        }
    }
}
