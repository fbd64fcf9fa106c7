use serde::Serialize;

use super::data::Row;

/// Upper bound on page size when the caller does not configure one.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// One page of rows plus the pagination bookkeeping callers need to walk
/// the full result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPage {
    pub content: Vec<Row>,
    pub page: u64,
    /// The effective page size after clamping, not the requested one.
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl RowPage {
    pub fn new(content: Vec<Row>, page: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = total_elements.div_ceil(size.max(1));
        // An empty table has no pages at all; page 0 is then both the
        // first and the last.
        let last = total_pages == 0 || page >= total_pages - 1;
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            first: page == 0,
            last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|_| Row::new()).collect()
    }

    #[test]
    fn test_middle_page_flags() {
        let page = RowPage::new(rows(10), 1, 10, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);
    }

    #[test]
    fn test_first_and_last_edges() {
        let first = RowPage::new(rows(10), 0, 10, 25);
        assert!(first.first);
        assert!(!first.last);

        let last = RowPage::new(rows(5), 2, 10, 25);
        assert!(!last.first);
        assert!(last.last);
    }

    #[test]
    fn test_empty_table_is_first_and_last() {
        let page = RowPage::new(rows(0), 0, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first);
        assert!(page.last);
    }

    #[test]
    fn test_exact_multiple() {
        let page = RowPage::new(rows(10), 1, 10, 20);
        assert_eq!(page.total_pages, 2);
        assert!(page.last);
    }
}
