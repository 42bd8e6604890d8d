use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl PaginationParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Row offset for LIMIT/OFFSET queries. Page numbers start at 1; a page past
    /// the addressable range saturates and yields an empty page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// Paginated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        let total_pages = if params.per_page > 0 {
            (total as f64 / params.per_page as f64).ceil() as u32
        } else {
            0 // Avoid division by zero
        };
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages,
        }
    }

    /// Slice an already-fetched list into one page.
    pub fn from_slice(all: &[T], params: PaginationParams) -> Self
    where
        T: Clone,
    {
        let start = (params.offset() as usize).min(all.len());
        let end = (start + params.per_page as usize).min(all.len());
        Self::new(all[start..end].to_vec(), all.len() as u64, params)
    }
}
