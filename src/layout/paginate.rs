//! Pagination by vertical center.
//!
//! An item belongs to page `p` when `p * H <= center_y < (p + 1) * H`.
//! Items are never split or duplicated; a center exactly on a boundary
//! goes to the later page. Centers outside the document are clamped to
//! the first or last page so nothing is lost here.

use crate::model::{LayoutItem, PageSize};
use serde::Serialize;

/// Total height to paginate: the largest of the page height, the measured
/// scroll height, and the bottom of any item.
pub fn total_content_height(page_height: f64, scroll_height: f64, items: &[LayoutItem]) -> f64 {
    let mut total = page_height;
    if scroll_height.is_finite() {
        total = total.max(scroll_height);
    }
    for item in items {
        let bottom = item.rect.bottom();
        if bottom.is_finite() {
            total = total.max(bottom);
        }
    }
    total
}

/// `ceil(total / page_height)`, at least 1.
pub fn page_count(total_height: f64, page_height: f64) -> usize {
    if !(page_height > 0.0) || !total_height.is_finite() {
        return 1;
    }
    let pages = (total_height / page_height).ceil();
    if pages < 1.0 {
        1
    } else {
        pages as usize
    }
}

/// Page index for a vertical center.
pub fn page_for_center(center_y: f64, page_height: f64, page_count: usize) -> usize {
    let last = page_count.saturating_sub(1);
    if !(page_height > 0.0) || !(center_y > 0.0) {
        return 0;
    }
    // `as usize` saturates, so very large centers land on the last page.
    ((center_y / page_height).floor() as usize).min(last)
}

/// One page's share of the item sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSlice {
    /// 0-based page index
    pub index: usize,

    /// Top edge of the page in document coordinates
    pub top: f64,

    /// Indices into the item sequence, ascending
    pub items: Vec<usize>,
}

/// The page partition of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    /// Page dimensions
    pub page_size: PageSize,

    /// Height that was paginated
    pub total_height: f64,

    /// Pages in order
    pub pages: Vec<PageSlice>,
}

impl Pagination {
    /// Partition `items` into pages of `page_size`.
    ///
    /// Only reads the items; the result refers to them by index.
    pub fn paginate(page_size: PageSize, scroll_height: f64, items: &[LayoutItem]) -> Self {
        let page_height = page_size.height as f64;
        let total_height = total_content_height(page_height, scroll_height, items);
        let count = page_count(total_height, page_height);

        let mut pages: Vec<PageSlice> = (0..count)
            .map(|index| PageSlice {
                index,
                top: index as f64 * page_height,
                items: Vec::new(),
            })
            .collect();

        for (i, item) in items.iter().enumerate() {
            let page = page_for_center(item.center_y(), page_height, count);
            pages[page].items.push(i);
        }

        log::debug!(
            "paginated {} items over {} pages ({:.1}px total)",
            items.len(),
            count,
            total_height
        );

        Self {
            page_size,
            total_height,
            pages,
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of item assignments across all pages.
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn item(y: f64, height: f64) -> LayoutItem {
        LayoutItem::new("x", Rect::new(0.0, y, 10.0, height))
    }

    #[test]
    fn test_single_short_item_is_one_page() {
        let items = vec![item(10.0, 50.0)];
        let p = Pagination::paginate(PageSize::A4_PORTRAIT, 200.0, &items);
        assert_eq!(p.page_count(), 1);
        assert_eq!(p.total_height, 1123.0);
        assert_eq!(p.pages[0].items, vec![0]);
    }

    #[test]
    fn test_scroll_height_drives_page_count() {
        let p = Pagination::paginate(PageSize::A4_PORTRAIT, 2200.0, &[]);
        assert_eq!(p.page_count(), 2);
    }

    #[test]
    fn test_item_geometry_extends_height() {
        let items = vec![item(3000.0, 40.0)];
        let p = Pagination::paginate(PageSize::A4_PORTRAIT, 500.0, &items);
        assert_eq!(p.total_height, 3040.0);
        assert_eq!(p.page_count(), 3);
        assert_eq!(p.pages[2].items, vec![0]);
    }

    #[test]
    fn test_boundary_goes_to_later_page() {
        // center = 1113 + 10 = 1123
        let items = vec![item(1113.0, 20.0)];
        let p = Pagination::paginate(PageSize::A4_PORTRAIT, 2246.0, &items);
        assert!(p.pages[0].items.is_empty());
        assert_eq!(p.pages[1].items, vec![0]);
    }

    #[test]
    fn test_straddling_item_follows_center() {
        // spans 1100..1140, center 1120 is on page 0
        let items = vec![item(1100.0, 40.0)];
        let p = Pagination::paginate(PageSize::A4_PORTRAIT, 2246.0, &items);
        assert_eq!(p.pages[0].items, vec![0]);
    }

    #[test]
    fn test_out_of_range_centers_clamped() {
        let items = vec![item(-100.0, 20.0), item(10.0, 20.0)];
        let p = Pagination::paginate(PageSize::SLIDE, 0.0, &items);
        assert_eq!(p.page_count(), 1);
        assert_eq!(p.item_count(), 2);

        assert_eq!(page_for_center(1e12, 540.0, 3), 2);
        assert_eq!(page_for_center(f64::NAN, 540.0, 3), 0);
    }

    #[test]
    fn test_every_item_assigned_once() {
        let items: Vec<LayoutItem> = (0..200).map(|i| item(i as f64 * 37.0, 18.0)).collect();
        let p = Pagination::paginate(PageSize::SLIDE, 0.0, &items);
        assert_eq!(p.item_count(), items.len());

        let mut seen: Vec<usize> = p.pages.iter().flat_map(|s| s.items.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_page_count_minimum() {
        assert_eq!(page_count(0.0, 1123.0), 1);
        assert_eq!(page_count(1123.0, 1123.0), 1);
        assert_eq!(page_count(1124.0, 1123.0), 2);
        assert_eq!(page_count(100.0, 0.0), 1);
    }
}
