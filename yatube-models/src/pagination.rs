use crate::{Error, Result};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Splits ordered sequences into numbered pages of a fixed size.
///
/// Requested page numbers are never an error: anything that is not a
/// positive integer gives the first page, anything past the end gives
/// the last one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paginator {
    page_size: i64,
}

/// Where a page sits in a sequence that lives in the database.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub offset: i64,
    pub limit: i64,
}

/// A single page of results
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// Items in this page
    pub object_list: Vec<T>,
    /// 1-based number of the page that was actually served
    pub number: i64,
    pub num_pages: i64,
    /// Total number of items across all pages
    pub count: i64,
    pub page_size: i64,
}

impl Paginator {
    pub fn new(page_size: i64) -> Result<Paginator> {
        if page_size <= 0 {
            return Err(Error::InvalidArgument(format!(
                "page size must be positive, got {}",
                page_size
            )));
        }
        Ok(Paginator { page_size })
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn count<T>(&self, items: &[T]) -> i64 {
        items.len() as i64
    }

    /// An empty sequence still has one (empty) page.
    pub fn num_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            1
        } else {
            (total - 1) / self.page_size + 1
        }
    }

    pub fn window(&self, total: i64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = parse_page_number(requested).min(num_pages);
        PageWindow {
            number,
            num_pages,
            offset: (number - 1) * self.page_size,
            limit: self.page_size,
        }
    }

    pub fn get_page<T: Clone>(&self, items: &[T], requested: Option<&str>) -> Page<T> {
        let total = self.count(items);
        let window = self.window(total, requested);
        let start = (window.offset as usize).min(items.len());
        let end = start.saturating_add(window.limit as usize).min(items.len());
        self.page(items[start..end].to_vec(), window, total)
    }

    /// Wraps items that were fetched for `window` into a page.
    pub fn page<T>(&self, object_list: Vec<T>, window: PageWindow, total: i64) -> Page<T> {
        Page {
            object_list,
            number: window.number,
            num_pages: window.num_pages,
            count: total.max(0),
            page_size: self.page_size,
        }
    }
}

fn parse_page_number(requested: Option<&str>) -> i64 {
    requested
        .and_then(|page| page.trim().parse::<i64>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            page_size: self.page_size,
        }
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut page = serializer.serialize_struct("Page", 7)?;
        page.serialize_field("object_list", &self.object_list)?;
        page.serialize_field("number", &self.number)?;
        page.serialize_field("num_pages", &self.num_pages)?;
        page.serialize_field("count", &self.count)?;
        page.serialize_field("page_size", &self.page_size)?;
        page.serialize_field("has_previous", &self.has_previous())?;
        page.serialize_field("has_next", &self.has_next())?;
        page.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;

    fn items(n: i64) -> Vec<i64> {
        (1..=n).collect()
    }

    #[test]
    fn rejects_non_positive_page_size() {
        assert!(matches!(Paginator::new(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(Paginator::new(-5), Err(Error::InvalidArgument(_))));
        assert_eq!(Paginator::new(1).unwrap().page_size(), 1);
    }

    #[test]
    fn splits_twenty_one_items_by_twenty() {
        let paginator = Paginator::new(20).unwrap();
        let items = items(21);

        let first = paginator.get_page(&items, None);
        assert_eq!(first.len(), 20);
        assert_eq!(first.number, 1);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.count, 21);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = paginator.get_page(&items, Some("2"));
        assert_eq!(second.object_list, vec![21]);
        assert!(!second.has_next());
        assert!(second.has_previous());
        assert_eq!(paginator.count(&items), 21);
    }

    #[test]
    fn huge_page_size() {
        let paginator = Paginator::new(i64::MAX).unwrap();
        assert_eq!(paginator.num_pages(i64::MAX), 1);
        let page = paginator.get_page(&[1, 2, 3], Some("1"));
        assert_eq!(page.object_list, vec![1, 2, 3]);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next());

        let paginator = Paginator::new(i64::MAX - 1).unwrap();
        assert_eq!(paginator.num_pages(i64::MAX), 2);
    }

    #[test]
    fn invalid_requests_clamp() {
        let paginator = Paginator::new(10).unwrap();
        let items = items(13);

        for requested in &[None, Some("abc"), Some("0"), Some("-3"), Some(""), Some("1.5")] {
            let page = paginator.get_page(&items, *requested);
            assert_eq!(page.number, 1, "{:?}", requested);
            assert_eq!(page.len(), 10);
        }

        let last = paginator.get_page(&items, Some("99"));
        assert_eq!(last.number, 2);
        assert_eq!(last.object_list, vec![11, 12, 13]);
    }

    #[test]
    fn empty_sequence_has_one_page() {
        let paginator = Paginator::new(10).unwrap();
        let page = paginator.get_page::<i64>(&[], Some("4"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.count, 0);
        assert!(page.is_empty());
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn pages_cover_the_sequence_in_order() {
        for size in 1..=7 {
            let paginator = Paginator::new(size).unwrap();
            for total in 0..=23 {
                let items = items(total);
                let num_pages = paginator.num_pages(total);
                let mut joined = Vec::new();
                for number in 1..=num_pages {
                    let page = paginator.get_page(&items, Some(number.to_string().as_str()));
                    assert_eq!(page.count, total);
                    assert!(page.len() as i64 <= size);
                    if total > 0 {
                        assert!(!page.is_empty());
                    }
                    joined.extend(page.object_list);
                }
                assert_eq!(joined, items);
            }
        }
    }

    #[test]
    fn window_matches_slices() {
        let paginator = Paginator::new(10).unwrap();
        assert_eq!(
            paginator.window(13, Some("2")),
            PageWindow {
                number: 2,
                num_pages: 2,
                offset: 10,
                limit: 10,
            }
        );
        assert_eq!(paginator.window(0, Some("2")).offset, 0);
    }

    #[test]
    fn page_serialization() {
        let paginator = Paginator::new(2).unwrap();
        let page = paginator.get_page(&items(3), Some("2"));
        assert_json_eq!(
            serde_json::to_value(&page).unwrap(),
            serde_json::json!({
                "object_list": [3],
                "number": 2,
                "num_pages": 2,
                "count": 3,
                "page_size": 2,
                "has_previous": true,
                "has_next": false,
            })
        );
    }
}
