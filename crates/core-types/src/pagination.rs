use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request, as received from query strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }.normalized()
    }

    /// Clamps the page to at least 1 and the limit to `1..=MAX_PAGE_SIZE`.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        let n = self.normalized();
        i64::from(n.page - 1) * i64::from(n.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.normalized().limit)
    }
}

/// One page of results plus enough information to render the page controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let request = request.normalized();
        let limit = i64::from(request.limit);
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(1, 5).offset(), 0);
        assert_eq!(PageRequest::new(3, 5).offset(), 10);
    }

    #[test]
    fn out_of_range_requests_are_clamped() {
        let req = PageRequest { page: 0, limit: 10_000 }.normalized();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest { page: 2, limit: 0 }.limit(), 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<u8> = Page::new(vec![], PageRequest::new(1, 5), 11);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], PageRequest::new(1, 5), 0);
        assert_eq!(empty.total_pages, 0);
    }
}
