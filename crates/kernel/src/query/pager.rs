//! Page windows and the paginated response envelope.

use serde::Serialize;
use tracing::warn;
use url::Url;

use super::params::QueryError;

/// Page size defaults and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            default_size: 9,
            max_size: 1000,
        }
    }
}

/// A requested page (1-indexed) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: PagerConfig::default().default_size,
        }
    }
}

/// Offset/limit window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl PagerConfig {
    /// Resolve raw `page` and `size` parameters.
    ///
    /// Absent values fall back to page 1 and the default size. Sizes above
    /// the maximum are clamped; zero or negative values are invalid.
    pub fn request(&self, page: Option<&str>, size: Option<&str>) -> Result<PageRequest, QueryError> {
        let page = match page {
            Some(raw) => positive("page", raw)?,
            None => 1,
        };

        let size = match size {
            Some(raw) => {
                let requested = positive("size", raw)?;
                if requested > self.max_size {
                    warn!(requested, max = self.max_size, "clamping page size");
                    self.max_size
                } else {
                    requested
                }
            }
            None => self.default_size,
        };

        Ok(PageRequest { page, size })
    }
}

fn positive(param: &'static str, raw: &str) -> Result<u32, QueryError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| QueryError::invalid(param, raw, "expected an integer"))?;
    if value <= 0 {
        return Err(QueryError::invalid(param, raw, "must be at least 1"));
    }
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

impl PageRequest {
    pub fn window(&self) -> Window {
        Window {
            offset: u64::from(self.page.saturating_sub(1)) * u64::from(self.size),
            limit: u64::from(self.size),
        }
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matches before paging.
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, count: u64, request: PageRequest) -> Self {
        Self {
            items,
            count,
            page: request.page,
            page_size: request.size,
        }
    }

    /// Total pages; an empty result set still has one (empty) page.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        let pages = self.count.div_ceil(u64::from(self.page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn next_page(&self) -> Option<u32> {
        (self.page < self.total_pages()).then(|| self.page + 1)
    }

    /// Previous page. Past the end this points back at the last page.
    pub fn previous_page(&self) -> Option<u32> {
        (self.page > 1).then(|| (self.page - 1).min(self.total_pages()))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Build the response envelope with links relative to `request_url`.
    pub fn into_response(self, request_url: &Url) -> PageResponse<T> {
        let total_pages = self.total_pages();
        let next = self.next_page().map(|p| page_link(request_url, p));
        let previous = self.previous_page().map(|p| page_link(request_url, p));

        PageResponse {
            count: self.count,
            next,
            previous,
            results: self.items,
            total_pages,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Paginated JSON envelope.
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
}

/// The request URL with its `page` parameter replaced.
pub fn page_link(request_url: &Url, page: u32) -> String {
    let mut url = request_url.clone();
    let kept: Vec<(String, String)> = request_url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    url.to_string()
}
