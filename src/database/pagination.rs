use serde::{Deserialize, Serialize};

use crate::{constants::MAX_PAGE_SIZE, error::Error};

// Keeps `offset()` within i64 for any accepted page size
const MAX_PAGE_NUMBER: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Requested page, 1-based, as read from `?page=&limit=`.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn from_query(query: PageQuery, default_size: i64) -> Self {
        Self {
            number: query.page.unwrap_or(1).clamp(1, MAX_PAGE_NUMBER),
            size: query.limit.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    /// Builds the envelope from one page of rows whose window count is `total_rows`.
    ///
    /// An empty page past the first is reported as [`Error::NotFound`].
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page: Page) -> Result<Self, Error> {
        if rows.is_empty() {
            if page.number > 1 {
                return Err(Error::not_found("Invalid page"));
            }
            return Ok(Self {
                count: 0,
                next: None,
                previous: None,
                results: rows,
            });
        }
        let page_count = (total_rows + page.size - 1) / page.size;

        let next = (page.number < page_count).then_some(page.number + 1);
        let previous = (page.number > 1).then_some((page.number - 1).min(page_count));

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        })
    }

    pub fn map<U, F>(self, f: F) -> PageContext<U>
    where
        F: FnMut(T) -> U,
    {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_clamped() {
        let page = Page::from_query(
            PageQuery {
                page: Some(0),
                limit: Some(10_000),
            },
            6,
        );
        assert_eq!(page, Page { number: 1, size: MAX_PAGE_SIZE });

        let page = Page::from_query(PageQuery::default(), 6);
        assert_eq!(page, Page { number: 1, size: 6 });
        assert_eq!(Page { number: 3, size: 6 }.offset(), 12);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let page = Page::from_query(
            PageQuery {
                page: Some(i64::MAX),
                limit: Some(MAX_PAGE_SIZE),
            },
            6,
        );
        assert!(page.offset() > 0);

        let page = Page::from_query(
            PageQuery {
                page: Some(i64::MAX),
                limit: None,
            },
            6,
        );
        assert!(page.offset() > 0);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = PageContext::from_rows(vec![1, 2], 14, Page { number: 2, size: 6 }).unwrap();
        assert_eq!(page.count, 14);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PageContext::from_rows(vec![1, 2], 14, Page { number: 3, size: 6 }).unwrap();
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));
    }

    #[test]
    fn empty_first_page() {
        let page: PageContext<i32> =
            PageContext::from_rows(vec![], 0, Page { number: 1, size: 6 }).unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
        assert!(page.results.is_empty());
    }

    #[test]
    fn page_past_the_end_is_not_found() {
        let result: Result<PageContext<i32>, Error> =
            PageContext::from_rows(vec![], 0, Page { number: 5, size: 6 });
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
