use serde::{Deserialize, Serialize};

pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl PaginationParams {
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Saturates instead of overflowing for absurd page numbers.
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// `offset()` as a SQL `OFFSET`, clamped into the `BIGINT` range.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset()).unwrap_or(i64::MAX)
    }

    pub fn sql_limit(&self) -> i64 {
        self.limit() as i64
    }

    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: default_page(), per_page: default_per_page() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page(),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}
