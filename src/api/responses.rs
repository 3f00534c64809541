//! Shared API response types
//!
//! Every paged list endpoint returns the same envelope so clients can
//! page through any collection with one component.

use serde::{Deserialize, Serialize};

use crate::models::{ListParams, Paginated};

/// Query parameters shared by the paged list endpoints
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

impl PageQuery {
    /// Clamped list parameters for the repository layer
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// Paged list response envelope
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_items: i64,
}

impl<T> Paged<T> {
    /// Build the envelope from a page of results, converting each item.
    pub fn from_page<S: Into<T>>(page: Paginated<S>) -> Self {
        let total_pages = page.total_pages();
        Self {
            data: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            per_page: page.per_page,
            total_pages,
            total_items: page.total,
        }
    }
}
