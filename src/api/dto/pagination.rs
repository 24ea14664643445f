//! Pagination query parameters and response metadata.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&limit=` query parameters.
///
/// Numbers arrive as strings when this struct is `#[serde(flatten)]`ed, hence `DisplayFromStr`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PaginationParams {
    /// Converts to a row `(offset, limit)` pair.
    ///
    /// `page` defaults to 1 and must be positive. `limit` defaults to 20 and
    /// must lie in `1..=100`.
    pub fn offset_limit(&self) -> Result<(i64, i64), String> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err("Page must be greater than 0".to_string());
        }

        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(format!("Limit must be between 1 and {MAX_PAGE_SIZE}"));
        }

        let offset = (page as i64 - 1) * limit as i64;

        Ok((offset, limit as i64))
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(page: u32, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}
