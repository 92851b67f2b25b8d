//! Persistent data store port and its implementations.
//!
//! Invariants every implementation keeps:
//! - `create_group` enrolls the owner as a member in the same step;
//! - deleting the owner's membership deletes the group with its members and wishes;
//! - deleting any other membership deletes that member's wishes in the group;
//! - missing rows are reported as [`Error::NotFound`].

use async_trait::async_trait;

use crate::{
    domain::{ChatId, GroupId, UserId, WishId},
    errors::Error,
    texts::Lang,
    Result,
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub chat_id: ChatId,
    pub language: Lang,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub owner_id: UserId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wish {
    pub id: WishId,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub url: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewWish {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub url: String,
    pub description: String,
}

#[async_trait]
pub trait DataStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<User>;
    /// Case-insensitive, without the leading `@`.
    async fn get_user_by_username(&self, username: &str) -> Result<User>;
    async fn create_user(&self, user: &User) -> Result<User>;

    async fn get_group(&self, id: GroupId) -> Result<Group>;
    /// Groups the user is a member of (owned ones included).
    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>>;
    async fn get_owned_groups(&self, owner_id: UserId) -> Result<Vec<Group>>;
    async fn create_group(&self, owner_id: UserId, name: &str) -> Result<Group>;

    async fn get_group_members(&self, group_id: GroupId) -> Result<Vec<GroupMember>>;
    async fn get_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember>;
    async fn create_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember>;
    async fn delete_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<()>;

    async fn get_wish(&self, id: WishId) -> Result<Wish>;
    async fn get_group_wishes(&self, group_id: GroupId) -> Result<Vec<Wish>>;
    async fn get_user_wishes(&self, user_id: UserId, group_id: GroupId) -> Result<Vec<Wish>>;
    /// Fails with `NotFound` unless the author is a member of the group.
    async fn create_wish(&self, wish: NewWish) -> Result<Wish>;
    async fn delete_wish(&self, id: WishId) -> Result<()>;

    async fn is_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool> {
        match self.get_group_member(group_id, user_id).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
