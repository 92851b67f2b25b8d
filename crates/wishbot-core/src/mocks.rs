//! Test doubles shared by the unit tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, GroupId, MessageId, MessageRef, UserId, WishId},
    errors::Error,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    store::{DataStore, Group, GroupMember, MemoryStore, NewWish, User, Wish},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sent {
    pub msg: MessageRef,
    pub html: String,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Debug, Default)]
struct Log {
    next_id: i32,
    sent: Vec<Sent>,
    deleted: Vec<MessageRef>,
    answered: Vec<String>,
    failing: HashSet<ChatId>,
}

/// Messenger that records every call instead of talking to Telegram.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    log: Mutex<Log>,
}

impl RecordingMessenger {
    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }

    /// Make every send to `chat_id` fail.
    pub fn fail_sends_to(&self, chat_id: ChatId) {
        self.lock().failing.insert(chat_id);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.lock().sent.clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<Sent> {
        self.lock()
            .sent
            .iter()
            .filter(|s| s.msg.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent_to(chat_id).into_iter().map(|s| s.html).collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.lock().deleted.clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.lock().answered.clone()
    }

    fn record(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let mut log = self.lock();
        if log.failing.contains(&chat_id) {
            return Err(Error::External(format!("chat {} unreachable", chat_id.0)));
        }
        log.next_id += 1;
        let msg = MessageRef {
            chat_id,
            message_id: MessageId(log.next_id),
        };
        log.sent.push(Sent {
            msg,
            html: html.to_string(),
            keyboard,
        });
        Ok(msg)
    }
}

#[async_trait]
impl MessagingPort for RecordingMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.record(chat_id, html, None)
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.record(chat_id, html, Some(keyboard))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.lock().deleted.push(msg);
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.lock().answered.push(callback_id.to_string());
        Ok(())
    }
}

/// Store whose membership lookups and group creation fail for chosen users.
/// Everything else goes straight to the wrapped [`MemoryStore`].
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    broken: Mutex<HashSet<UserId>>,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            broken: Mutex::new(HashSet::new()),
        }
    }

    pub fn break_user(&self, user_id: UserId) {
        self.broken.lock().unwrap().insert(user_id);
    }

    fn check(&self, user_id: UserId) -> Result<()> {
        if self.broken.lock().unwrap().contains(&user_id) {
            Err(Error::Store("db hiccup".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DataStore for FlakyStore {
    async fn get_user(&self, id: UserId) -> Result<User> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.inner.get_user_by_username(username).await
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        self.inner.create_user(user).await
    }

    async fn get_group(&self, id: GroupId) -> Result<Group> {
        self.inner.get_group(id).await
    }

    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>> {
        self.inner.get_user_groups(user_id).await
    }

    async fn get_owned_groups(&self, owner_id: UserId) -> Result<Vec<Group>> {
        self.inner.get_owned_groups(owner_id).await
    }

    async fn create_group(&self, owner_id: UserId, name: &str) -> Result<Group> {
        self.check(owner_id)?;
        self.inner.create_group(owner_id, name).await
    }

    async fn get_group_members(&self, group_id: GroupId) -> Result<Vec<GroupMember>> {
        self.inner.get_group_members(group_id).await
    }

    async fn get_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember> {
        self.check(user_id)?;
        self.inner.get_group_member(group_id, user_id).await
    }

    async fn create_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember> {
        self.inner.create_group_member(group_id, user_id).await
    }

    async fn delete_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        self.inner.delete_group_member(group_id, user_id).await
    }

    async fn get_wish(&self, id: WishId) -> Result<Wish> {
        self.inner.get_wish(id).await
    }

    async fn get_group_wishes(&self, group_id: GroupId) -> Result<Vec<Wish>> {
        self.inner.get_group_wishes(group_id).await
    }

    async fn get_user_wishes(&self, user_id: UserId, group_id: GroupId) -> Result<Vec<Wish>> {
        self.inner.get_user_wishes(user_id, group_id).await
    }

    async fn create_wish(&self, wish: NewWish) -> Result<Wish> {
        self.inner.create_wish(wish).await
    }

    async fn delete_wish(&self, id: WishId) -> Result<()> {
        self.inner.delete_wish(id).await
    }
}
