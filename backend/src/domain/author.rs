//! Author profile attached to users in the `authors` group.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{UserId, Username};

/// Stable author identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(Uuid);

impl AuthorId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Publishing profile of a user.
///
/// The rating moves with the likes and dislikes of the author's posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: AuthorId,
    user_id: UserId,
    username: Username,
    rating: i64,
}

impl Author {
    pub fn new(id: AuthorId, user_id: UserId, username: Username, rating: i64) -> Self {
        Self {
            id,
            user_id,
            username,
            rating,
        }
    }

    pub fn id(&self) -> AuthorId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn rating(&self) -> i64 {
        self.rating
    }
}
