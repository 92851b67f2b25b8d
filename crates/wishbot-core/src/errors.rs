use crate::callback::DecodeError;

/// Core error type for the wish bot.
///
/// The router maps each variant to exactly one user-facing outcome: silent drop
/// (`Decode`), a specific denial (`PermissionDenied`), or the generic failure reply.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("malformed callback token: {0}")]
    Decode(#[from] DecodeError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(Denial),

    #[error("store error: {0}")]
    Store(String),

    #[error("external error: {0}")]
    External(String),
}

/// Which ownership/membership rule an action broke.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("not the owner of group {group_name:?}")]
    NotOwner { group_name: String },

    #[error("not a member of group {group_name:?}")]
    NotMember { group_name: String },

    #[error("not the author of the wish")]
    NotWishAuthor,
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Error::NotFound("row".to_string()),
            other => Error::Store(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
