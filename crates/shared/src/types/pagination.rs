//! Page/offset plumbing for the list endpoints.

use serde::{Deserialize, Serialize};

/// Hard cap on page size; larger requests are clamped, not refused.
pub const MAX_PER_PAGE: u32 = 100;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 20;

/// Query-string pagination parameters, 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number; page 0 is treated as page 1.
    #[serde(default = "PageRequest::first_page")]
    pub page: u32,
    /// Items per page, clamped to [`MAX_PER_PAGE`].
    #[serde(default = "PageRequest::default_size")]
    pub per_page: u32,
}

impl PageRequest {
    fn first_page() -> u32 {
        DEFAULT_PAGE
    }

    fn default_size() -> u32 {
        DEFAULT_PER_PAGE
    }

    /// Row offset for the database query.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * self.limit()
    }

    /// Row limit for the database query.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page.clamp(1, MAX_PER_PAGE))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// A page of results plus the counters clients need to paginate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Page counters.
    pub meta: PageMeta,
}

/// Page counters attached to every list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page, 1-indexed.
    pub page: u32,
    /// Requested page size.
    pub per_page: u32,
    /// Total matching rows.
    pub total: u64,
    /// Total pages; at least 1 even when empty.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Wraps one page of `data` with its counters.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let size = u64::from(per_page.clamp(1, MAX_PER_PAGE));
        let total_pages = total.div_ceil(size).max(1);

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let page = PageRequest {
            page: 3,
            per_page: 20,
        };
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
    }

    #[test]
    fn test_first_page_offset_is_zero() {
        assert_eq!(PageRequest::default().offset(), 0);
    }

    #[test]
    fn test_oversized_page_is_clamped() {
        let page = PageRequest {
            page: 2,
            per_page: 10_000,
        };
        assert_eq!(page.limit(), u64::from(MAX_PER_PAGE));
        assert_eq!(page.offset(), u64::from(MAX_PER_PAGE));
    }

    #[test]
    fn test_total_pages() {
        let resp = PageResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(resp.meta.total_pages, 3);

        let empty: PageResponse<i32> = PageResponse::new(vec![], 1, 20, 0);
        assert_eq!(empty.meta.total_pages, 1);
    }
}
