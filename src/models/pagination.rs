use serde::{Deserialize, Serialize};

/// Page sizes offered by list screens.
pub const ALLOWED_PER_PAGE: [i64; 4] = [10, 25, 50, 100];

pub const DEFAULT_PER_PAGE: i64 = 10;

/// Page-based pagination parameters.
///
/// `page` is clamped to at least 1 and `per_page` falls back to 10 unless it
/// is one of [`ALLOWED_PER_PAGE`].
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Build from raw query strings; anything unparsable counts as absent.
    pub fn from_raw(page: Option<&str>, per_page: Option<&str>) -> Self {
        Self {
            page: page.and_then(|p| p.trim().parse().ok()),
            per_page: per_page.and_then(|p| p.trim().parse().ok()),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        match self.per_page {
            Some(n) if ALLOWED_PER_PAGE.contains(&n) => n,
            _ => DEFAULT_PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub per_page_options: [i64; 4],
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        let per_page = params.per_page();
        Self {
            items,
            total,
            page: params.page(),
            per_page,
            total_pages: (total + per_page - 1) / per_page,
            per_page_options: ALLOWED_PER_PAGE,
        }
    }
}
