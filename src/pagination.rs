//! Paging and sorting for list endpoints.

use crate::Error;

/// The page to return when a request does not specify one.
pub const DEFAULT_PAGE: u32 = 1;
/// The number of items per page when a request does not specify a limit.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// The largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The 1-based page number.
    pub page: u32,
    /// The maximum number of items on a page.
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build a page request from optional query parameters, using the defaults
    /// for missing values.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `page` or `limit` is zero, or if `limit`
    /// exceeds [MAX_PAGE_SIZE].
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, Error> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(Error::Validation("page must be at least 1".to_owned()));
        }

        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
            )));
        }

        Ok(Self { page, limit })
    }

    /// The number of items to skip to reach the start of the page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

/// The direction to sort a list in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Parse the `sortOrder` query parameter. Only "desc" sorts descending,
    /// anything else (including nothing) sorts ascending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    /// The SQL keyword for the sort direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Pagination, SortOrder},
    };

    #[test]
    fn missing_values_use_defaults() {
        let pagination = Pagination::new(None, None).unwrap();

        assert_eq!(pagination, Pagination::default());
        assert_eq!(pagination.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let pagination = Pagination::new(Some(3), Some(15)).unwrap();

        assert_eq!(pagination.offset(), 30);
    }

    #[test]
    fn rejects_zero_page() {
        assert!(matches!(
            Pagination::new(Some(0), None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_oversized_limit() {
        assert!(matches!(
            Pagination::new(None, Some(MAX_PAGE_SIZE + 1)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Pagination::new(None, Some(0)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn only_desc_sorts_descending() {
        assert_eq!(SortOrder::from_param(Some("desc")), SortOrder::Descending);
        assert_eq!(SortOrder::from_param(Some("asc")), SortOrder::Ascending);
        assert_eq!(SortOrder::from_param(Some("sideways")), SortOrder::Ascending);
        assert_eq!(SortOrder::from_param(None), SortOrder::Ascending);
    }
}
