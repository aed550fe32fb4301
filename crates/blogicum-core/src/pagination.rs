//! Page arithmetic shared by every listing.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Listing page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Requested page: a 1-based number or the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    Number(u64),
    Last,
}

impl Default for PageNumber {
    fn default() -> Self {
        PageNumber::Number(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page number is not a positive integer")]
    Malformed,

    #[error("page {0} is out of range")]
    OutOfRange(u64),
}

impl FromStr for PageNumber {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "last" {
            return Ok(PageNumber::Last);
        }
        match s.parse::<u64>() {
            Ok(0) | Err(_) => Err(PageError::Malformed),
            Ok(n) => Ok(PageNumber::Number(n)),
        }
    }
}

/// A page number together with the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: PageNumber,
    pub size: u64,
}

/// Offset and limit of a resolved page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Number of pages for `total_items`. An empty listing still has one page.
pub fn total_pages(total_items: u64, size: u64) -> u64 {
    if total_items == 0 {
        1
    } else {
        total_items.div_ceil(size.max(1))
    }
}

impl PageRequest {
    pub fn new(number: PageNumber, size: u64) -> Self {
        Self {
            number,
            size: size.max(1),
        }
    }

    /// Resolve against the size of the filtered set.
    pub fn window(&self, total_items: u64) -> Result<PageWindow, PageError> {
        let pages = total_pages(total_items, self.size);
        let number = match self.number {
            PageNumber::Last => pages,
            PageNumber::Number(n) if n <= pages => n,
            PageNumber::Number(n) => return Err(PageError::OutOfRange(n)),
        };
        Ok(PageWindow {
            number,
            offset: (number - 1) * self.size,
            limit: self.size,
        })
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total_items: u64) -> Self {
        Self {
            items,
            number: window.number,
            page_size: window.limit,
            total_items,
            total_pages: total_pages(total_items, window.limit),
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_number() {
        assert_eq!("3".parse::<PageNumber>(), Ok(PageNumber::Number(3)));
        assert_eq!("last".parse::<PageNumber>(), Ok(PageNumber::Last));
        assert_eq!("0".parse::<PageNumber>(), Err(PageError::Malformed));
        assert_eq!("-1".parse::<PageNumber>(), Err(PageError::Malformed));
        assert_eq!("two".parse::<PageNumber>(), Err(PageError::Malformed));
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let request = PageRequest::new(PageNumber::Number(1), 10);
        let window = request.window(0).unwrap();
        assert_eq!(window, PageWindow { number: 1, offset: 0, limit: 10 });
        assert!(PageRequest::new(PageNumber::Number(2), 10).window(0).is_err());
    }

    #[test]
    fn test_window_bounds() {
        let window = PageRequest::new(PageNumber::Number(3), 10).window(25).unwrap();
        assert_eq!(window.offset, 20);
        assert_eq!(
            PageRequest::new(PageNumber::Number(4), 10).window(25),
            Err(PageError::OutOfRange(4))
        );
        assert_eq!(PageRequest::new(PageNumber::Last, 10).window(25).unwrap().number, 3);
    }

    #[test]
    fn test_pages_cover_every_item_once() {
        let total = 37;
        let size = 10;
        let covered: u64 = (1..=total_pages(total, size))
            .map(|n| {
                let w = PageRequest::new(PageNumber::Number(n), size).window(total).unwrap();
                w.limit.min(total - w.offset)
            })
            .sum();
        assert_eq!(covered, total);
    }

    #[test]
    fn test_page_navigation_flags() {
        let window = PageRequest::new(PageNumber::Number(2), 10).window(30).unwrap();
        let page = Page::new(vec![1, 2, 3], window, 30);
        assert!(page.has_next());
        assert!(page.has_previous());
        assert_eq!(page.map(|n| n * 2).items, vec![2, 4, 6]);
    }
}
