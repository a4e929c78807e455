//! Paginated read result.

use serde::Serialize;

/// One page of entities plus the metadata a pagination renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<E> {
    pub items: Vec<E>,
    /// Matching rows across all pages.
    pub total: u64,
    pub per_page: u64,
    /// 1-indexed.
    pub current_page: u64,
    /// Always at least 1, even when `total` is 0.
    pub last_page: u64,
    /// Query-string key the caller paginates with.
    pub page_name: String,
}

impl<E> Page<E> {
    pub fn new(
        items: Vec<E>,
        total: u64,
        per_page: u64,
        current_page: u64,
        page_name: impl Into<String>,
    ) -> Self {
        let last_page = total.div_ceil(per_page.max(1)).max(1);
        Self {
            items,
            total,
            per_page,
            current_page,
            last_page,
            page_name: page_name.into(),
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Row offset of the page window.
    pub fn offset(&self) -> u64 {
        self.current_page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn map<U>(self, f: impl FnMut(E) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
            page_name: self.page_name,
        }
    }
}
