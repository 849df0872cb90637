//! Page-number pagination primitives shared by newspaper list endpoints.
//!
//! [`PageRequest`] validates 1-based page numbers and derives the offset and
//! limit used by repositories. [`Page`] wraps one page of items together with
//! totals and navigation links built from the request URL.

use serde::{Deserialize, Serialize};
use url::Url;

/// Page size used when callers do not request one explicitly.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest page size accepted by [`PageRequest::new`].
pub const MAX_PER_PAGE: u32 = 100;

/// Query parameter carrying the page number in navigation links.
pub const PAGE_PARAM: &str = "page";

/// Errors raised while validating pagination input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Page numbers start at 1.
    #[error("page must be at least 1")]
    ZeroPage,
    /// Page size is zero or above [`MAX_PER_PAGE`].
    #[error("page size must be between 1 and {max}")]
    InvalidPerPage {
        /// Maximum accepted page size.
        max: u32,
    },
    /// The requested page lies beyond the last page.
    #[error("page {page} is out of range; last page is {last_page}")]
    OutOfRange {
        /// Requested page number.
        page: u32,
        /// Number of the last available page.
        last_page: u32,
    },
}

/// Validated request for a single page.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(3, 10).expect("valid request");
/// assert_eq!(request.offset(), 20);
/// assert_eq!(request.limit(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Validate a page number and page size.
    ///
    /// # Errors
    /// Returns [`PageRequestError::ZeroPage`] for page `0` and
    /// [`PageRequestError::InvalidPerPage`] for sizes outside
    /// `1..=MAX_PER_PAGE`.
    pub const fn new(page: u32, per_page: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(PageRequestError::InvalidPerPage { max: MAX_PER_PAGE });
        }
        Ok(Self { page, per_page })
    }

    /// Request the first page with the default page size.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of items to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page as u64
    }

    /// Ensure the page exists for a collection of `total_items`.
    ///
    /// The first page always exists, even for an empty collection.
    ///
    /// # Errors
    /// Returns [`PageRequestError::OutOfRange`] when the page lies beyond the
    /// last page.
    pub fn ensure_in_range(&self, total_items: u64) -> Result<(), PageRequestError> {
        let last_page = last_page(total_items, self.per_page);
        if self.page > last_page {
            return Err(PageRequestError::OutOfRange {
                page: self.page,
                last_page,
            });
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// Number of the last page for `total_items`, never less than 1.
///
/// # Examples
/// ```
/// use pagination::last_page;
///
/// assert_eq!(last_page(0, 10), 1);
/// assert_eq!(last_page(21, 10), 3);
/// ```
#[must_use]
pub fn last_page(total_items: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    let pages = total_items.div_ceil(per_page).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Link to the current page.
    #[serde(rename = "self")]
    pub current: String,
    /// Link to the next page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Link to the previous page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// One page of items with totals and navigation links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub per_page: u32,
    /// Items across all pages.
    pub total_items: u64,
    /// Number of pages, never less than 1.
    pub total_pages: u32,
    /// Navigation links derived from the request URL.
    pub links: PageLinks,
}

impl<T> Page<T> {
    /// Assemble a page and derive its links from `base`.
    ///
    /// Existing query parameters on `base` are preserved; only the page
    /// parameter is replaced.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    /// use url::Url;
    ///
    /// let base = Url::parse("http://localhost/api/v1/news?page=2").expect("valid url");
    /// let request = PageRequest::new(2, 10).expect("valid request");
    /// let page = Page::new(vec![1, 2, 3], request, 23, &base);
    /// assert_eq!(page.total_pages, 3);
    /// assert_eq!(page.links.next.as_deref(), Some("http://localhost/api/v1/news?page=3"));
    /// assert_eq!(page.links.prev.as_deref(), Some("http://localhost/api/v1/news?page=1"));
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64, base: &Url) -> Self {
        let total_pages = last_page(total_items, request.per_page());
        let page = request.page();
        let next = (page < total_pages).then(|| page_link(base, page.saturating_add(1)));
        let prev = (page > 1).then(|| page_link(base, page.saturating_sub(1)));
        Self {
            items,
            page,
            per_page: request.per_page(),
            total_items,
            total_pages,
            links: PageLinks {
                current: page_link(base, page),
                next,
                prev,
            },
        }
    }

    /// Transform the items while keeping paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            links: self.links,
        }
    }
}

fn page_link(base: &Url, page: u32) -> String {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key.as_ref() != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(PAGE_PARAM, &page.to_string());
    }
    url.to_string()
}
