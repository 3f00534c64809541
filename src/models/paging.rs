//! Pagination types shared by the paged list endpoints

use serde::{Deserialize, Serialize};

/// Parameters for paged list queries
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListParams {
    /// 1-based page number
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl ListParams {
    /// Create list parameters, clamping out-of-range values.
    ///
    /// Page numbers below 1 become 1, and the page size is clamped to 1..=100.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Row offset for the current page
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// Row limit for the current page
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// A single page of results together with the total row count
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// Create a page of results
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Total number of pages for the current page size
    pub fn total_pages(&self) -> u32 {
        if self.total <= 0 {
            return 0;
        }
        ((self.total as u64).div_ceil(self.per_page as u64)) as u32
    }

    /// Map the items of the page, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamps_page() {
        let params = ListParams::new(0, 10);
        assert_eq!(params.page, 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_list_params_clamps_per_page() {
        let params = ListParams::new(1, 0);
        assert_eq!(params.per_page, 1);

        let params = ListParams::new(1, 1000);
        assert_eq!(params.per_page, 100);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let params = ListParams::new(3, 25);
        assert_eq!(params.offset(), 50);
        assert_eq!(params.limit(), 25);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let params = ListParams::new(1, 10);
        let page: Paginated<i32> = Paginated::new(vec![], 101, &params);
        assert_eq!(page.total_pages(), 11);
    }

    #[test]
    fn test_total_pages_empty() {
        let params = ListParams::new(1, 10);
        let page: Paginated<i32> = Paginated::new(vec![], 0, &params);
        assert_eq!(page.total_pages(), 0);
    }
}
