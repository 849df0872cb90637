//! Rolling-window cap on how many posts an author may publish.

use chrono::{DateTime, Duration, Utc};

use super::Error;

/// Default number of posts allowed per window.
pub const DEFAULT_MAX_POSTS_PER_DAY: u32 = 3;

/// Cap of `max_posts` creations within any rolling `window`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use newspaper::domain::DailyPostLimit;
///
/// let quota = DailyPostLimit::default().quota(Utc::now());
/// assert!(quota.admits(2));
/// assert!(!quota.admits(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPostLimit {
    max_posts: u32,
    window: Duration,
}

impl DailyPostLimit {
    pub fn new(max_posts: u32) -> Self {
        Self {
            max_posts,
            window: Duration::hours(24),
        }
    }

    pub fn max_posts(&self) -> u32 {
        self.max_posts
    }

    /// Exclusive start of the window ending at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// The quota a post created at `now` must fit into.
    pub fn quota(&self, now: DateTime<Utc>) -> PostQuota {
        PostQuota {
            max_posts: self.max_posts,
            since: self.window_start(now),
        }
    }

    /// Error returned once the window is full.
    pub fn rejection(&self) -> Error {
        let message = format!("You can't post more than {} posts per day!", self.max_posts);
        Error::invalid_request(message).with_details(
            serde_json::json!({ "code": "daily_post_limit", "limit": self.max_posts }),
        )
    }
}

/// Posts an author may still have inside one window.
///
/// Repositories count the author's posts created strictly after `since` and
/// insert only if [`PostQuota::admits`] the count, holding a per-author lock
/// across both steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuota {
    pub max_posts: u32,
    pub since: DateTime<Utc>,
}

impl PostQuota {
    pub fn admits(&self, recent_posts: u64) -> bool {
        recent_posts < u64::from(self.max_posts)
    }
}

impl Default for DailyPostLimit {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POSTS_PER_DAY)
    }
}
