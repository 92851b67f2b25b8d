use std::path::Path;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};

use crate::{
    domain::{ChatId, GroupId, UserId, WishId},
    errors::Error,
    store::{DataStore, Group, GroupMember, NewWish, User, Wish},
    texts::Lang,
    Result,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id   INTEGER PRIMARY KEY,
    username  TEXT,
    chat_id   INTEGER NOT NULL,
    language  TEXT NOT NULL DEFAULT 'en'
);

CREATE TABLE IF NOT EXISTS groups (
    group_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL,
    owner_id  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS group_members (
    group_id  INTEGER NOT NULL REFERENCES groups(group_id) ON DELETE CASCADE,
    user_id   INTEGER NOT NULL,
    PRIMARY KEY (group_id, user_id)
);

CREATE TABLE IF NOT EXISTS wishes (
    wish_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id    INTEGER NOT NULL,
    user_id     INTEGER NOT NULL,
    url         TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (group_id, user_id)
        REFERENCES group_members(group_id, user_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_users_username ON users(username COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_wishes_member ON wishes(group_id, user_id);
"#;

/// SQLite-backed store. Cascades are enforced by foreign keys.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema.
    pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database. One pinned connection keeps the data alive.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let language: String = row.try_get("language")?;
    Ok(User {
        id: UserId(row.try_get("user_id")?),
        username: row.try_get("username")?,
        chat_id: ChatId(row.try_get("chat_id")?),
        language: Lang::from_code(Some(&language)),
    })
}

fn group_from_row(row: &SqliteRow) -> Result<Group> {
    Ok(Group {
        id: GroupId(row.try_get("group_id")?),
        name: row.try_get("name")?,
        owner_id: UserId(row.try_get("owner_id")?),
    })
}

fn member_from_row(row: &SqliteRow) -> Result<GroupMember> {
    Ok(GroupMember {
        group_id: GroupId(row.try_get("group_id")?),
        user_id: UserId(row.try_get("user_id")?),
    })
}

fn wish_from_row(row: &SqliteRow) -> Result<Wish> {
    Ok(Wish {
        id: WishId(row.try_get("wish_id")?),
        group_id: GroupId(row.try_get("group_id")?),
        user_id: UserId(row.try_get("user_id")?),
        url: row.try_get("url")?,
        description: row.try_get("description")?,
    })
}

fn not_found(what: impl Into<String>) -> impl FnOnce(Error) -> Error {
    let what = what.into();
    move |e| match e {
        Error::NotFound(_) => Error::NotFound(what),
        other => other,
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn get_user(&self, id: UserId) -> Result<User> {
        let row = sqlx::query(
            "SELECT user_id, username, chat_id, language FROM users WHERE user_id = ?",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::from)
        .map_err(not_found(format!("user {}", id.0)))?;
        user_from_row(&row)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let row = sqlx::query(
            "SELECT user_id, username, chat_id, language FROM users \
             WHERE username = ? COLLATE NOCASE ORDER BY user_id LIMIT 1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::from)
        .map_err(not_found(format!("user @{username}")))?;
        user_from_row(&row)
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        sqlx::query("INSERT INTO users (user_id, username, chat_id, language) VALUES (?, ?, ?, ?)")
            .bind(user.id.0)
            .bind(user.username.as_deref())
            .bind(user.chat_id.0)
            .bind(user.language.code())
            .execute(&self.pool)
            .await?;
        Ok(user.clone())
    }

    async fn get_group(&self, id: GroupId) -> Result<Group> {
        let row = sqlx::query("SELECT group_id, name, owner_id FROM groups WHERE group_id = ?")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::from)
            .map_err(not_found(format!("group {}", id.0)))?;
        group_from_row(&row)
    }

    async fn get_user_groups(&self, user_id: UserId) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT g.group_id, g.name, g.owner_id FROM groups g \
             JOIN group_members m ON m.group_id = g.group_id \
             WHERE m.user_id = ? ORDER BY g.group_id",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(group_from_row).collect()
    }

    async fn get_owned_groups(&self, owner_id: UserId) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT group_id, name, owner_id FROM groups WHERE owner_id = ? ORDER BY group_id",
        )
        .bind(owner_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(group_from_row).collect()
    }

    async fn create_group(&self, owner_id: UserId, name: &str) -> Result<Group> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO groups (name, owner_id) VALUES (?, ?)")
            .bind(name)
            .bind(owner_id.0)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(owner_id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Group {
            id: GroupId(id),
            name: name.to_string(),
            owner_id,
        })
    }

    async fn get_group_members(&self, group_id: GroupId) -> Result<Vec<GroupMember>> {
        let rows = sqlx::query(
            "SELECT group_id, user_id FROM group_members WHERE group_id = ? ORDER BY user_id",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(member_from_row).collect()
    }

    async fn get_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember> {
        let row = sqlx::query(
            "SELECT group_id, user_id FROM group_members WHERE group_id = ? AND user_id = ?",
        )
        .bind(group_id.0)
        .bind(user_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::from)
        .map_err(not_found(format!(
            "member {} of group {}",
            user_id.0, group_id.0
        )))?;
        member_from_row(&row)
    }

    async fn create_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<GroupMember> {
        self.get_group(group_id).await?;
        sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES (?, ?)")
            .bind(group_id.0)
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(GroupMember { group_id, user_id })
    }

    async fn delete_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        self.get_group_member(group_id, user_id).await?;
        let group = self.get_group(group_id).await?;
        if group.owner_id == user_id {
            sqlx::query("DELETE FROM groups WHERE group_id = ?")
                .bind(group_id.0)
                .execute(&self.pool)
                .await?;
        } else {
            sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
                .bind(group_id.0)
                .bind(user_id.0)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn get_wish(&self, id: WishId) -> Result<Wish> {
        let row = sqlx::query(
            "SELECT wish_id, group_id, user_id, url, description FROM wishes WHERE wish_id = ?",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::from)
        .map_err(not_found(format!("wish {}", id.0)))?;
        wish_from_row(&row)
    }

    async fn get_group_wishes(&self, group_id: GroupId) -> Result<Vec<Wish>> {
        let rows = sqlx::query(
            "SELECT wish_id, group_id, user_id, url, description FROM wishes \
             WHERE group_id = ? ORDER BY wish_id",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(wish_from_row).collect()
    }

    async fn get_user_wishes(&self, user_id: UserId, group_id: GroupId) -> Result<Vec<Wish>> {
        let rows = sqlx::query(
            "SELECT wish_id, group_id, user_id, url, description FROM wishes \
             WHERE group_id = ? AND user_id = ? ORDER BY wish_id",
        )
        .bind(group_id.0)
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(wish_from_row).collect()
    }

    async fn create_wish(&self, wish: NewWish) -> Result<Wish> {
        self.get_group_member(wish.group_id, wish.user_id).await?;
        let id = sqlx::query(
            "INSERT INTO wishes (group_id, user_id, url, description) VALUES (?, ?, ?, ?)",
        )
        .bind(wish.group_id.0)
        .bind(wish.user_id.0)
        .bind(&wish.url)
        .bind(&wish.description)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(Wish {
            id: WishId(id),
            group_id: wish.group_id,
            user_id: wish.user_id,
            url: wish.url,
            description: wish.description,
        })
    }

    async fn delete_wish(&self, id: WishId) -> Result<()> {
        let res = sqlx::query("DELETE FROM wishes WHERE wish_id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound(format!("wish {}", id.0)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn username_lookup_ignores_case() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .create_user(&User {
                id: UserId(7),
                username: Some("MiXeD".into()),
                chat_id: ChatId(70),
                language: Lang::Uk,
            })
            .await
            .unwrap();
        let found = store.get_user_by_username("mixed").await.unwrap();
        assert_eq!(found.id, UserId(7));
        assert_eq!(found.language, Lang::Uk);
    }

    #[tokio::test]
    async fn user_without_username_round_trips() {
        let store = SqliteStore::in_memory().await.unwrap();
        let u = User {
            id: UserId(8),
            username: None,
            chat_id: ChatId(80),
            language: Lang::En,
        };
        store.create_user(&u).await.unwrap();
        assert_eq!(store.get_user(UserId(8)).await.unwrap(), u);
    }
}
