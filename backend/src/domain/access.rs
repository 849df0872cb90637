//! Group membership and the permissions it grants.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named group a user can belong to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    /// Every registered user.
    Common,
    /// Users allowed to publish and edit posts.
    Authors,
}

impl Group {
    /// Stable storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Authors => "authors",
        }
    }

    /// Permissions granted by membership in this group.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Common => &[],
            Self::Authors => &[
                Permission::AddPost,
                Permission::ChangePost,
                Permission::DeletePost,
            ],
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored group name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown group: {0}")]
pub struct UnknownGroupError(pub String);

impl FromStr for Group {
    type Err = UnknownGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "authors" => Ok(Self::Authors),
            other => Err(UnknownGroupError(other.to_owned())),
        }
    }
}

/// Action guarded by a permission check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    AddPost,
    ChangePost,
    DeletePost,
}

impl Permission {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddPost => "add_post",
            Self::ChangePost => "change_post",
            Self::DeletePost => "delete_post",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union of the permissions granted by `groups`.
pub fn permissions_for(groups: impl IntoIterator<Item = Group>) -> BTreeSet<Permission> {
    groups
        .into_iter()
        .flat_map(|group| group.permissions().iter().copied())
        .collect()
}
