//! Page-level types.

use super::{LayoutItem, Resource};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Requested page format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// ISO A4 (210 x 297 mm)
    #[default]
    A4,
    /// Presentation slide (10 x 5.625 inches)
    Slide,
}

/// Anything other than `slide` parses as A4.
impl FromStr for PageFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "slide" => PageFormat::Slide,
            "a4" | "" => PageFormat::A4,
            other => {
                log::warn!("unknown page format {:?}, using A4", other);
                PageFormat::A4
            }
        })
    }
}

/// Page orientation. Only affects A4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide
    #[default]
    Portrait,
    /// Wider than tall
    Landscape,
}

/// Anything other than `landscape` parses as portrait.
impl FromStr for Orientation {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "landscape" => Orientation::Landscape,
            "portrait" | "" => Orientation::Portrait,
            other => {
                log::warn!("unknown orientation {:?}, using portrait", other);
                Orientation::Portrait
            }
        })
    }
}

/// Fixed page dimensions in CSS pixels (96 DPI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width in pixels
    pub width: u32,

    /// Page height in pixels
    pub height: u32,
}

impl PageSize {
    /// A4 portrait at 96 DPI.
    pub const A4_PORTRAIT: PageSize = PageSize {
        width: 794,
        height: 1123,
    };

    /// 10in x 5.625in slide at 96 DPI.
    pub const SLIDE: PageSize = PageSize {
        width: 960,
        height: 540,
    };

    /// Create a page size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolve the page size for a format and orientation.
    ///
    /// Slides are always 960x540; orientation only swaps A4.
    pub fn resolve(format: PageFormat, orientation: Orientation) -> Self {
        match (format, orientation) {
            (PageFormat::Slide, _) => Self::SLIDE,
            (PageFormat::A4, Orientation::Portrait) => Self::A4_PORTRAIT,
            (PageFormat::A4, Orientation::Landscape) => Self::A4_PORTRAIT.swapped(),
        }
    }

    /// Swap width and height.
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4_PORTRAIT
    }
}

/// One output page: its background raster and the items whose center lies on it.
#[derive(Debug, Clone)]
pub struct PageFrame {
    /// 0-based page index
    pub index: usize,

    /// Page dimensions shared by every page of the document
    pub size: PageSize,

    /// Snapshot of this page's slice with text painted transparent
    pub background: Resource,

    /// Items assigned to this page, in visual order
    pub items: Vec<LayoutItem>,
}

impl PageFrame {
    /// Create an empty frame.
    pub fn new(index: usize, size: PageSize, background: Resource) -> Self {
        Self {
            index,
            size,
            background,
            items: Vec::new(),
        }
    }

    /// Top edge of the page in document coordinates.
    pub fn top(&self) -> f64 {
        self.index as f64 * self.size.height as f64
    }

    /// Check if the page carries no text.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
