//! Render surface abstraction layer.
//!
//! Provides a trait-based interface over the external rendering engine,
//! isolating CSS layout and rasterization from the page-flow logic. A
//! surface reports raw text nodes with their computed style strings and
//! geometry; interpreting those strings is the flow extractor's job.

mod snapshot;

#[cfg(feature = "chrome")]
mod chrome;

#[cfg(feature = "chrome")]
pub use chrome::ChromeEngine;
pub use snapshot::{RenderSnapshot, SnapshotEngine, SnapshotSurface};

use crate::error::Result;
use crate::model::{PageSize, Rect};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Viewport fixed before any content loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,

    /// Height in CSS pixels
    pub height: u32,

    /// Device pixels per CSS pixel for captures
    pub device_scale_factor: f64,
}

impl Viewport {
    /// Create a viewport matching a page size.
    pub fn for_page(size: PageSize, device_scale_factor: f64) -> Self {
        Self {
            width: size.width,
            height: size.height,
            device_scale_factor,
        }
    }
}

/// A region of the document to rasterize, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRegion {
    /// Left edge
    pub x: f64,
    /// Top edge in document coordinates
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
    /// Output scale factor
    pub scale: f64,
}

impl ClipRegion {
    /// The clip covering page `index` of the given size.
    pub fn for_page(index: usize, size: PageSize, scale: f64) -> Self {
        Self {
            x: 0.0,
            y: index as f64 * size.height as f64,
            width: size.width as f64,
            height: size.height as f64,
            scale,
        }
    }

    /// Output raster dimensions in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        let w = (self.width * self.scale).round().max(1.0) as u32;
        let h = (self.height * self.scale).round().max(1.0) as u32;
        (w, h)
    }
}

/// Encoding for captured rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossy JPEG with the given quality (0-100)
    Jpeg {
        /// Encoder quality
        quality: u8,
    },
    /// Lossless PNG
    Png,
}

impl ImageFormat {
    /// MIME type of the encoded output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg { .. } => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Jpeg { quality: 90 }
    }
}

/// Raw computed style strings of a text node's parent element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComputedStyle {
    /// `display`, e.g. `"block"` or `"none"`
    pub display: String,

    /// `visibility`, e.g. `"visible"` or `"hidden"`
    pub visibility: String,

    /// `opacity` as a decimal string
    pub opacity: String,

    /// `color` in `rgb()`/`rgba()` form
    pub color: String,

    /// `font-size` with unit, e.g. `"16px"`
    pub font_size: String,

    /// `font-family` list as reported by the engine
    pub font_family: String,

    /// `font-weight`, keyword or number
    pub font_weight: String,

    /// `font-style`, e.g. `"italic"`
    pub font_style: String,

    /// `text-align`, e.g. `"center"`
    pub text_align: String,
}

/// A text node as reported by the render surface, before any filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextNode {
    /// Untrimmed text content
    pub text: String,

    /// Tag name of the immediate parent element, if any
    #[serde(default)]
    pub parent_tag: Option<String>,

    /// Selection-range bounding box in document coordinates
    pub rect: Rect,

    /// Computed style of the parent element, if it could be resolved
    #[serde(default)]
    pub style: Option<ComputedStyle>,
}

/// Factory for render surfaces.
///
/// Every conversion request opens its own surface; surfaces are never
/// shared across requests.
pub trait RenderEngine: Send + Sync {
    /// Surface type produced by this engine.
    type Surface: RenderSurface;

    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Acquire a surface whose viewport is fixed to `viewport`.
    ///
    /// The surface is released when dropped.
    fn open(&self, viewport: &Viewport) -> Result<Self::Surface>;
}

/// A live rendered document.
pub trait RenderSurface {
    /// Load HTML, waiting at most `timeout` for the page to settle.
    fn load_html(&mut self, html: &str, timeout: Duration) -> Result<()>;

    /// Return every non-whitespace text node in document visual order.
    fn text_nodes(&mut self) -> Result<Vec<RawTextNode>>;

    /// Measured scroll height of the document.
    fn scroll_height(&mut self) -> Result<f64>;

    /// Paint all text transparent without changing layout.
    fn hide_text(&mut self) -> Result<()>;

    /// Rasterize a region of the document.
    fn capture(&mut self, clip: &ClipRegion, format: ImageFormat) -> Result<Vec<u8>>;
}

/// Stylesheet that hides text while keeping layout untouched.
pub const HIDE_TEXT_CSS: &str = "* { color: transparent !important; text-shadow: none !important; } \
     ::placeholder { color: transparent !important; }";
