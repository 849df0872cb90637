//! Background jobs executed by the task worker.

use std::fmt;

use super::PostId;

/// Unit of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Mail every subscriber of the post's categories.
    NotifySubscribers { post_id: PostId },
    /// Mail each category's subscribers a list of last week's posts.
    WeeklyDigest,
}

impl Task {
    /// Stable job name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NotifySubscribers { .. } => "notify_subscribers",
            Self::WeeklyDigest => "weekly_digest",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotifySubscribers { post_id } => write!(f, "{}({post_id})", self.name()),
            Self::WeeklyDigest => f.write_str(self.name()),
        }
    }
}
