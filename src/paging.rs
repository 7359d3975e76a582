//! Slicing an ordered result set into fixed-size pages.
//!
//! Page numbers start at 1. Page 1 is always accepted, even when there is
//! nothing to show: an empty set has a `page_count` of 0 and an empty first
//! page. Any other number below 1 or past the last page is rejected.

use std::fmt;

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_NUMBER: i64 = 1;

#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: i64,
    pub page_size: usize,
    pub page_count: i64,
    pub total_item_count: usize,
}

impl<T> Page<T> {
    pub fn has_previous_page(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page_number < self.page_count
    }

    /// Number of items before this page, for stores that slice themselves.
    pub fn offset(&self) -> usize {
        offset(self.page_number, self.page_size)
    }
}

#[derive(Serialize, PartialEq, Eq, Debug, Clone, Copy)]
pub struct InvalidPage {
    pub page_number: i64,
    pub page_count: i64,
}

impl fmt::Display for InvalidPage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "page {} is out of range (page count {})", self.page_number, self.page_count)
    }
}

pub fn page_count(total: usize, page_size: usize) -> i64 {
    if page_size == 0 {
        return 0;
    }
    ((total + page_size - 1) / page_size) as i64
}

fn offset(page_number: i64, page_size: usize) -> usize {
    (page_number.max(1) as usize - 1).saturating_mul(page_size)
}

/// Cuts page `page_number` (default 1) out of `items`.
pub fn paginate<T>(items: Vec<T>, page_number: Option<i64>, page_size: usize)
    -> Result<Page<T>, InvalidPage>
{
    let page_number = page_number.unwrap_or(DEFAULT_PAGE_NUMBER);
    let total = items.len();
    let page_count = page_count(total, page_size);

    if page_number < 1 || (page_number != 1 && page_number > page_count) {
        return Err(InvalidPage {
            page_number: page_number,
            page_count: page_count,
        });
    }

    let items = items.into_iter()
        .skip(offset(page_number, page_size))
        .take(page_size)
        .collect();

    Ok(Page {
        items: items,
        page_number: page_number,
        page_size: page_size,
        page_count: page_count,
        total_item_count: total,
    })
}

#[cfg(test)]
mod tests {
    use super::{paginate, InvalidPage, DEFAULT_PAGE_SIZE};

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_full_and_last_pages() {
        let total = 23;
        for p in 1..=3 {
            let page = paginate(numbers(total), Some(p), DEFAULT_PAGE_SIZE).unwrap();
            assert_eq!(page.page_count, 3);
            assert_eq!(page.total_item_count, total);
            let expected = if p == 3 { total % DEFAULT_PAGE_SIZE } else { DEFAULT_PAGE_SIZE };
            assert_eq!(page.items.len(), expected);
        }
        let last = paginate(numbers(total), Some(3), DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(last.items, vec![21, 22, 23]);
        assert!(last.has_previous_page());
        assert!(!last.has_next_page());
    }

    #[test]
    fn test_exact_multiple_last_page_is_full() {
        let page = paginate(numbers(20), Some(2), 10).unwrap();
        assert_eq!(page.page_count, 2);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.offset(), 10);
    }

    #[test]
    fn test_default_page_number() {
        let page = paginate(numbers(15), None, 10).unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.items, numbers(10));
        assert!(!page.has_previous_page());
        assert!(page.has_next_page());
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            paginate(numbers(15), Some(0), 10),
            Err(InvalidPage { page_number: 0, page_count: 2 })
        );
        assert_eq!(
            paginate(numbers(15), Some(-4), 10),
            Err(InvalidPage { page_number: -4, page_count: 2 })
        );
        assert_eq!(
            paginate(numbers(15), Some(3), 10),
            Err(InvalidPage { page_number: 3, page_count: 2 })
        );
    }

    #[test]
    fn test_empty_set() {
        let page = paginate(Vec::<usize>::new(), Some(1), 10).unwrap();
        assert_eq!(page.page_count, 0);
        assert!(page.items.is_empty());
        assert!(!page.has_next_page());

        assert_eq!(
            paginate(Vec::<usize>::new(), Some(2), 10),
            Err(InvalidPage { page_number: 2, page_count: 0 })
        );
    }
}
