use serde::{Deserialize, Serialize};

/// Default number of items per page on list endpoints.
pub const DEFAULT_PAGE_SIZE: u64 = 6;
/// Upper bound for the `limit` query parameter.
pub const MAX_PAGE_SIZE: u64 = 100;
/// Largest OFFSET/LIMIT value the database drivers bind (a signed 64-bit
/// integer).
pub const MAX_ROW_BOUND: u64 = i64::MAX as u64;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 6)]
    pub limit: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 8)]
    pub total_pages: u64,
}

/// `page`/`limit` window shared by every paginated endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Page number, 1-based.
    pub page: Option<u64>,
    /// Items per page (1-100).
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Clamp the requested window into `(page, limit)`.
    pub fn window(&self) -> (u64, u64) {
        let page = Ord::max(self.page.unwrap_or(1), 1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }

    pub fn offset(&self) -> u64 {
        let (page, limit) = self.window();
        (page - 1).saturating_mul(limit).min(MAX_ROW_BOUND)
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        let (page, limit) = self.window();
        Pagination {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
