// Pagination helpers for in-memory lists

/// Returns the 1-based `page` of `items`, `page_size` entries per page.
///
/// Page 0, a zero page size, or a page past the end yields an empty slice.
pub fn page<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = page_size.saturating_mul(page - 1);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` items; must be given the same page size as [`page`].
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Current page of the transaction list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self { current_page: 1 }
    }
}

impl PaginationState {
    pub fn reset(&mut self) {
        self.current_page = 1;
    }
}
