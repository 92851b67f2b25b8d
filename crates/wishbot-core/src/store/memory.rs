use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::{
    domain::{GroupId, UserId, WishId},
    errors::Error,
    store::{DataStore, Group, GroupMember, NewWish, User, Wish},
    Result,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<GroupId, Group>,
    members: BTreeSet<(GroupId, UserId)>,
    wishes: BTreeMap<WishId, Wish>,
    last_group_id: i64,
    last_wish_id: i64,
}

impl Tables {
    fn drop_membership(&mut self, group_id: GroupId, user_id: UserId) {
        self.members.remove(&(group_id, user_id));
        self.wishes
            .retain(|_, w| !(w.group_id == group_id && w.user_id == user_id));
    }

    fn drop_group(&mut self, group_id: GroupId) {
        self.groups.remove(&group_id);
        self.members.retain(|(g, _)| *g != group_id);
        self.wishes.retain(|_, w| w.group_id != group_id);
    }
}

/// In-process store. Ids are assigned sequentially starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<User> {
        self.lock()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {}", id.0)))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.lock()
            .users
            .values()
            .find(|u| {
                u.username
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(username))
            })
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user @{username}")))
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        let mut t = self.lock();
        if t.users.contains_key(&user.id) {
            return Err(Error::Store(format!("user {} already exists", user.id.0)));
        }
        t.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_group(&self, id: GroupId) -> Result<Group> {
        self.lock()
            .groups
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("group {}", id.0)))
    }

    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>> {
        let t = self.lock();
        Ok(t.groups
            .values()
            .filter(|g| t.members.contains(&(g.id, user_id)))
            .cloned()
            .collect())
    }

    async fn get_owned_groups(&self, owner_id: UserId) -> Result<Vec<Group>> {
        Ok(self
            .lock()
            .groups
            .values()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_group(&self, owner_id: UserId, name: &str) -> Result<Group> {
        let mut t = self.lock();
        t.last_group_id += 1;
        let group = Group {
            id: GroupId(t.last_group_id),
            name: name.to_string(),
            owner_id,
        };
        t.groups.insert(group.id, group.clone());
        t.members.insert((group.id, owner_id));
        Ok(group)
    }

    async fn get_group_members(&self, group_id: GroupId) -> Result<Vec<GroupMember>> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|(g, _)| *g == group_id)
            .map(|&(group_id, user_id)| GroupMember { group_id, user_id })
            .collect())
    }

    async fn get_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember> {
        if self.lock().members.contains(&(group_id, user_id)) {
            Ok(GroupMember { group_id, user_id })
        } else {
            Err(Error::NotFound(format!(
                "member {} of group {}",
                user_id.0, group_id.0
            )))
        }
    }

    async fn create_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember> {
        let mut t = self.lock();
        if !t.groups.contains_key(&group_id) {
            return Err(Error::NotFound(format!("group {}", group_id.0)));
        }
        if !t.members.insert((group_id, user_id)) {
            return Err(Error::Store(format!(
                "user {} is already a member of group {}",
                user_id.0, group_id.0
            )));
        }
        Ok(GroupMember { group_id, user_id })
    }

    async fn delete_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        let mut t = self.lock();
        if !t.members.contains(&(group_id, user_id)) {
            return Err(Error::NotFound(format!(
                "member {} of group {}",
                user_id.0, group_id.0
            )));
        }
        let owned = t
            .groups
            .get(&group_id)
            .is_some_and(|g| g.owner_id == user_id);
        if owned {
            t.drop_group(group_id);
        } else {
            t.drop_membership(group_id, user_id);
        }
        Ok(())
    }

    async fn get_wish(&self, id: WishId) -> Result<Wish> {
        self.lock()
            .wishes
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("wish {}", id.0)))
    }

    async fn get_group_wishes(&self, group_id: GroupId) -> Result<Vec<Wish>> {
        Ok(self
            .lock()
            .wishes
            .values()
            .filter(|w| w.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn get_user_wishes(&self, user_id: UserId, group_id: GroupId) -> Result<Vec<Wish>> {
        Ok(self
            .lock()
            .wishes
            .values()
            .filter(|w| w.group_id == group_id && w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_wish(&self, wish: NewWish) -> Result<Wish> {
        let mut t = self.lock();
        if !t.members.contains(&(wish.group_id, wish.user_id)) {
            return Err(Error::NotFound(format!(
                "member {} of group {}",
                wish.user_id.0, wish.group_id.0
            )));
        }
        t.last_wish_id += 1;
        let created = Wish {
            id: WishId(t.last_wish_id),
            group_id: wish.group_id,
            user_id: wish.user_id,
            url: wish.url,
            description: wish.description,
        };
        t.wishes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_wish(&self, id: WishId) -> Result<()> {
        self.lock()
            .wishes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("wish {}", id.0)))
    }
}
