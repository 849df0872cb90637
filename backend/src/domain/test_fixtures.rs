//! Shared builders for domain unit tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{
    AuthorId, CategoryId, CategoryRef, CategoryTitle, EmailAddress, Post, PostAuthor,
    PostContent, PostId, PostKind, PostTitle, Subscriber, User, UserId, Username,
};

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(crate) fn timestamp(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("fixture timestamp is unambiguous")
}

pub(crate) fn username(raw: &str) -> Username {
    Username::new(raw).expect("fixture username")
}

pub(crate) fn user(raw_username: &str) -> User {
    User::new(
        UserId::random(),
        username(raw_username),
        EmailAddress::new(format!("{raw_username}@example.com")).expect("fixture email"),
        timestamp(2024, 1, 1, 0),
    )
}

pub(crate) fn subscriber(raw_username: &str) -> Subscriber {
    let user = user(raw_username);
    Subscriber {
        user_id: user.id().clone(),
        username: user.username().clone(),
        email: user.email().clone(),
    }
}

pub(crate) fn category_ref(id: i64, title: &str) -> CategoryRef {
    CategoryRef {
        id: CategoryId::new(id),
        title: CategoryTitle::new(title).expect("fixture category title"),
    }
}

pub(crate) fn post(id: i64, title: &str, content: &str) -> Post {
    Post {
        id: PostId::new(id),
        kind: PostKind::Article,
        author: PostAuthor {
            id: AuthorId::random(),
            username: username("writer"),
        },
        title: PostTitle::new(title).expect("fixture title"),
        content: PostContent::new(content).expect("fixture content"),
        categories: vec![category_ref(1, "Science")],
        rating: 0,
        created_at: timestamp(2024, 3, 4, 9),
    }
}
