//! Page math for spreading a dynamic list across the slots of one key.

use std::ops::Range;

use crate::layout::GridLayout;

/// Zero-based page cursor over `element_count` items.
///
/// A page size of zero means "not laid out yet": there are no pages and the
/// cursor stays on page 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    element_count: usize,
    page_size: usize,
    max_pages: usize,
    page: usize,
}

impl Paginator {
    pub fn new(element_count: usize) -> Self {
        Self {
            element_count,
            page_size: 0,
            max_pages: 0,
            page: 0,
        }
    }

    /// One page per fill of the slots carrying `key`.
    pub fn for_layout(layout: &GridLayout, key: &str, element_count: usize) -> Self {
        Self::new(element_count).with_page_size(layout.count_symbol(key))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.set_page_size(page_size);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.set_page(page);
        self
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size;
        self.max_pages = if page_size == 0 {
            0
        } else {
            self.element_count.div_ceil(page_size)
        };
        self.set_page(self.page);
    }

    pub fn reset_page_size(&mut self) {
        self.page_size = 0;
        self.max_pages = 0;
        self.page = 0;
    }

    /// Move to `page`, clamped into the valid range.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.max_pages.saturating_sub(1));
    }

    pub fn is_valid(&self, page: usize) -> bool {
        page < self.max_pages
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn has_next(&self) -> bool {
        self.is_valid(self.page + 1)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0 && self.max_pages > 0
    }

    /// Advance one page; returns false when already on the last page.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Element indices shown on the current page.
    pub fn page_range(&self) -> Range<usize> {
        if self.max_pages == 0 {
            return 0..0;
        }
        let start = self.page * self.page_size;
        let end = (start + self.page_size).min(self.element_count);
        start..end
    }

    pub fn page_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.page_range();
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }

    /// Pair each slot carrying `key` with the current page's items, in slot
    /// order. Slots beyond the last item are left out.
    pub fn assign<'a, T>(&self, layout: &GridLayout, key: &str, items: &'a [T]) -> Vec<(usize, &'a T)> {
        layout
            .slots_for(key)
            .into_iter()
            .zip(self.page_items(items))
            .collect()
    }
}
