//! Composition of subscriber notification and digest emails.

use std::fmt;

use url::Url;

use super::category::{CategoryTitle, Subscriber};
use super::post::Post;
use super::user::EmailAddress;

/// Characters of post content quoted in a new-post notification.
pub const NOTIFICATION_EXCERPT_CHARS: usize = 50;

/// Subject of the weekly digest email.
pub const DIGEST_SUBJECT: &str = "Weekly digest";

/// Outgoing email with a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

/// Error raised when the configured site URL cannot be used as a base.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("site url must be an absolute http(s) url: {0}")]
pub struct SiteUrlError(pub String);

/// Public base URL used to build links in outgoing mail.
///
/// # Examples
/// ```
/// use newspaper::domain::SiteUrl;
///
/// let site = SiteUrl::parse("https://paper.example/").unwrap();
/// assert_eq!(site.absolute("/news/7"), "https://paper.example/news/7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrl(String);

impl SiteUrl {
    pub fn parse(raw: &str) -> Result<Self, SiteUrlError> {
        let url = Url::parse(raw.trim()).map_err(|_| SiteUrlError(raw.to_owned()))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(SiteUrlError(raw.to_owned()));
        }
        Ok(Self(url.as_str().trim_end_matches('/').to_owned()))
    }

    /// Join a root-relative path onto the base.
    pub fn absolute(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl fmt::Display for SiteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One email per subscriber announcing `post` in `category`.
pub fn new_post_notifications(
    post: &Post,
    category: &CategoryTitle,
    subscribers: &[Subscriber],
    site: &SiteUrl,
) -> Vec<EmailMessage> {
    let subject = format!("New article in category {category}");
    let body = format!(
        "Check out the new article: {}. {}... Read it at: {}",
        post.title,
        post.content.excerpt(NOTIFICATION_EXCERPT_CHARS),
        site.absolute(&post.absolute_path()),
    );
    subscribers
        .iter()
        .map(|subscriber| EmailMessage {
            to: subscriber.email.clone(),
            subject: subject.clone(),
            body: body.clone(),
        })
        .collect()
}

/// Digest body listing `posts` of one category, one `title: url` per line.
pub fn digest_body(category: &CategoryTitle, posts: &[Post], site: &SiteUrl) -> String {
    let lines: Vec<String> = posts
        .iter()
        .map(|post| format!("{}: {}", post.title, site.absolute(&post.absolute_path())))
        .collect();
    format!("News posts in {category}:\n{}", lines.join("\n"))
}

/// One digest email per subscriber; nothing when `posts` is empty.
pub fn weekly_digest(
    category: &CategoryTitle,
    posts: &[Post],
    subscribers: &[Subscriber],
    site: &SiteUrl,
) -> Vec<EmailMessage> {
    if posts.is_empty() {
        return Vec::new();
    }
    let body = digest_body(category, posts, site);
    subscribers
        .iter()
        .map(|subscriber| EmailMessage {
            to: subscriber.email.clone(),
            subject: DIGEST_SUBJECT.to_owned(),
            body: body.clone(),
        })
        .collect()
}
