//! JSON layout report.

use crate::error::{Error, Result};
use crate::layout::Pagination;
use crate::model::{LayoutItem, PageSize};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Measured layout of a document, grouped by page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    /// Page dimensions in pixels
    pub page_size: PageSize,

    /// Height that was paginated
    pub total_height: f64,

    /// Number of pages
    pub page_count: usize,

    /// Pages in order
    pub pages: Vec<PageReport>,
}

/// One page of a [`LayoutReport`].
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// 0-based page index
    pub index: usize,

    /// Top edge in document coordinates
    pub top: f64,

    /// Items whose center lies on this page
    pub items: Vec<LayoutItem>,
}

impl LayoutReport {
    /// Group `items` by the page assignment in `pagination`.
    pub fn new(pagination: &Pagination, items: &[LayoutItem]) -> Self {
        let pages = pagination
            .pages
            .iter()
            .map(|slice| PageReport {
                index: slice.index,
                top: slice.top,
                items: slice
                    .items
                    .iter()
                    .filter_map(|&i| items.get(i).cloned())
                    .collect(),
            })
            .collect();

        Self {
            page_size: pagination.page_size,
            total_height: pagination.total_height,
            page_count: pagination.page_count(),
            pages,
        }
    }

    /// Total number of items across all pages.
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|p| p.items.len()).sum()
    }
}

/// Convert a layout report to JSON.
pub fn to_json(report: &LayoutReport, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(report),
        JsonFormat::Compact => serde_json::to_string(report),
    };

    result.map_err(|e| Error::Serialization(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn report() -> LayoutReport {
        let items = vec![
            LayoutItem::new("Hello", Rect::new(8.0, 8.0, 40.0, 18.0)),
            LayoutItem::new("World", Rect::new(8.0, 600.0, 40.0, 18.0)),
        ];
        let pagination = Pagination::paginate(PageSize::SLIDE, 0.0, &items);
        LayoutReport::new(&pagination, &items)
    }

    #[test]
    fn test_report_groups_by_page() {
        let report = report();
        assert_eq!(report.page_count, 2);
        assert_eq!(report.item_count(), 2);
        assert_eq!(report.pages[1].items[0].text, "World");
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&report(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"pageCount\": 2"));
        assert!(json.contains("\"color\": \"000000\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&report(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }
}
