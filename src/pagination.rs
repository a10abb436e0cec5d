/// A resolved page over a record set. Requested pages outside the valid
/// range clamp to the first/last page instead of erroring, matching the
/// console's pagination contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Page {
    pub number: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub per_page: i64,
}

impl Page {
    pub fn resolve(total_count: i64, per_page: i64, requested: Option<&str>) -> Self {
        debug_assert!(per_page > 0);

        let total_pages = ((total_count.max(0) + per_page - 1) / per_page).max(1);

        // Non-numeric or missing values fall back to the first page,
        // past-the-end clamps to the last page.
        let number = requested
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, total_pages);

        Self {
            number,
            total_pages,
            total_count: total_count.max(0),
            per_page,
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_default() {
        let page = Page::resolve(25, 10, None);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_non_numeric_clamps_to_first() {
        assert_eq!(Page::resolve(25, 10, Some("abc")).number, 1);
        assert_eq!(Page::resolve(25, 10, Some("")).number, 1);
    }

    #[test]
    fn test_below_range_clamps_to_first() {
        assert_eq!(Page::resolve(25, 10, Some("0")).number, 1);
        assert_eq!(Page::resolve(25, 10, Some("-3")).number, 1);
    }

    #[test]
    fn test_past_the_end_clamps_to_last() {
        let page = Page::resolve(25, 10, Some("999"));
        assert_eq!(page.number, 3);
        assert_eq!(page.offset(), 20);
    }

    #[test]
    fn test_empty_set_is_one_page() {
        let page = Page::resolve(0, 10, Some("7"));
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_exact_boundary() {
        assert_eq!(Page::resolve(30, 10, Some("3")).total_pages, 3);
        assert_eq!(Page::resolve(31, 10, None).total_pages, 4);
    }
}
