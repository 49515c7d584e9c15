// src/page.rs
// Offset pagination shared by list endpoints

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters `?page=&size=` (page is zero-based)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(0)
    }

    /// Requested size clamped into 1..=MAX_PAGE_SIZE
    pub fn size(&self) -> u32 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.size() as i64
    }

    pub fn offset(&self) -> i64 {
        self.page() as i64 * self.size() as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, params: &PageParams, total_elements: i64) -> Self {
        let size = params.size();
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size as i64 - 1) / size as i64
        };

        Self {
            content,
            page: params.page(),
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(PageParams::default().size(), DEFAULT_PAGE_SIZE);
        assert_eq!(PageParams::new(0, 0).size(), 1);
        assert_eq!(PageParams::new(0, 5000).size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages() {
        let params = PageParams::new(2, 10);
        assert_eq!(params.offset(), 20);

        let page: Page<u8> = Page::new(vec![], &params, 21);
        assert_eq!(page.total_pages, 3);

        let empty: Page<u8> = Page::new(vec![], &params, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
