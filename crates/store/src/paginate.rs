//! Offset pagination with client-facing metadata.

use serde::{Deserialize, Serialize};

/// A page request: 1-based page number plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Default page size when the caller does not specify one.
    pub const DEFAULT_SIZE: u32 = 10;
    /// Upper bound on page size.
    pub const MAX_SIZE: u32 = 100;
    /// Upper bound on page number.
    pub const MAX_NUMBER: u32 = 10_000;

    /// Creates a page request, rejecting out-of-range values.
    pub fn new(number: u32, size: u32) -> Option<Self> {
        if number == 0 || number > Self::MAX_NUMBER || size == 0 || size > Self::MAX_SIZE {
            return None;
        }
        Some(Self { number, size })
    }

    /// The first page with the default size.
    pub fn first() -> Self {
        Self {
            number: 1,
            size: Self::DEFAULT_SIZE,
        }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    /// Number of records to fetch.
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first()
    }
}

/// Pagination metadata returned alongside every listed page.
///
/// All fields are zero when there are no matching records at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    pub current_page: u32,
    pub page_size: u32,
    pub first_page: u32,
    pub last_page: u32,
    pub total_records: u64,
}

impl PageMetadata {
    /// Computes metadata for a page request over `total` records.
    pub fn compute(page: Page, total: u64) -> Self {
        if total == 0 {
            return Self::default();
        }

        Self {
            current_page: page.number,
            page_size: page.size,
            first_page: 1,
            last_page: total.div_ceil(u64::from(page.size)) as u32,
            total_records: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_new_validates_bounds() {
        assert!(Page::new(1, 10).is_some());
        assert!(Page::new(0, 10).is_none());
        assert!(Page::new(1, 0).is_none());
        assert!(Page::new(1, 101).is_none());
        assert!(Page::new(10_001, 10).is_none());
    }

    #[test]
    fn offset_is_zero_based() {
        let page = Page::new(3, 10).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn metadata_is_all_zero_when_empty() {
        let meta = PageMetadata::compute(Page::first(), 0);
        assert_eq!(meta, PageMetadata::default());
        assert_eq!(meta.total_records, 0);
    }

    #[test]
    fn metadata_last_page_rounds_up() {
        let page = Page::new(1, 10).unwrap();
        assert_eq!(PageMetadata::compute(page, 100).last_page, 10);
        assert_eq!(PageMetadata::compute(page, 101).last_page, 11);
        assert_eq!(PageMetadata::compute(page, 1).last_page, 1);
    }

    #[test]
    fn metadata_reflects_request_beyond_last_page() {
        let page = Page::new(9, 10).unwrap();
        let meta = PageMetadata::compute(page, 15);
        assert_eq!(meta.current_page, 9);
        assert_eq!(meta.last_page, 2);
        assert_eq!(meta.total_records, 15);
    }
}
