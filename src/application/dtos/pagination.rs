use serde::{Serialize, Deserialize};

/// Paging progress of the loaded window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDto {
    /// Items loaded so far
    pub loaded: usize,
    /// Page size
    pub page_size: usize,
    /// Pages loaded
    pub pages_loaded: usize,
    /// Total item count (unknown before the first page)
    pub total_items: Option<usize>,
    /// Total page count
    pub total_pages: Option<usize>,
    /// Whether another page can be fetched
    pub has_next: bool,
}

impl PaginationDto {
    pub fn new(loaded: usize, page_size: usize, total_items: Option<usize>) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.map(|total| total.div_ceil(page_size));

        Self {
            loaded,
            page_size,
            pages_loaded: loaded.div_ceil(page_size),
            total_items,
            total_pages,
            has_next: total_items.map_or(true, |total| loaded < total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_window() {
        let dto = PaginationDto::new(100, 50, Some(120));
        assert_eq!(dto.pages_loaded, 2);
        assert_eq!(dto.total_pages, Some(3));
        assert!(dto.has_next);
    }

    #[test]
    fn test_unknown_total_has_next() {
        let dto = PaginationDto::new(0, 50, None);
        assert_eq!(dto.total_pages, None);
        assert!(dto.has_next);
    }
}
