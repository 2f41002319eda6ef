use serde::{Deserialize, Serialize};

use flightdeck_core::repository::PageParams;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn params(&self) -> PageParams {
        PageParams::new(self.page, self.page_size)
    }
}

/// Standard list envelope for the paginated collections.
#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> PageEnvelope<T> {
    pub fn new(params: PageParams, count: i64, results: Vec<T>) -> Self {
        Self {
            count,
            page: params.page,
            page_size: params.page_size,
            results,
        }
    }
}
