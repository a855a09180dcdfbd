//! Replay surface backed by a recorded measurement.
//!
//! A [`RenderSnapshot`] holds the raw text nodes and scroll height that a
//! real engine reported for one document. Replaying it lets the whole
//! pipeline run without a browser; captures are blank rasters of the
//! requested clip size.

use super::{ClipRegion, ImageFormat, RawTextNode, RenderEngine, RenderSurface, Viewport};
use crate::error::{Error, Result};
use crate::model::RgbColor;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A recorded measurement of one rendered document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    /// Measured `scrollHeight` of the document element
    pub scroll_height: f64,

    /// Raw text nodes in document order
    pub nodes: Vec<RawTextNode>,
}

impl RenderSnapshot {
    /// Create a snapshot.
    pub fn new(scroll_height: f64, nodes: Vec<RawTextNode>) -> Self {
        Self {
            scroll_height,
            nodes,
        }
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("invalid render snapshot: {}", e)))
    }

    /// Read a snapshot from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the snapshot to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("JSON serialization error: {}", e)))
    }
}

/// Engine that replays a [`RenderSnapshot`] for every request.
#[derive(Debug, Clone)]
pub struct SnapshotEngine {
    snapshot: Arc<RenderSnapshot>,
    paper: RgbColor,
}

impl SnapshotEngine {
    /// Create an engine replaying `snapshot`.
    pub fn new(snapshot: RenderSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            paper: RgbColor(255, 255, 255),
        }
    }

    /// Create an engine from snapshot JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(RenderSnapshot::from_json(json)?))
    }

    /// Create an engine from a snapshot file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(RenderSnapshot::from_path(path)?))
    }

    /// Fill color of the replayed captures.
    pub fn with_paper(mut self, color: RgbColor) -> Self {
        self.paper = color;
        self
    }

    /// The replayed snapshot.
    pub fn snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }
}

impl RenderEngine for SnapshotEngine {
    type Surface = SnapshotSurface;

    fn name(&self) -> &str {
        "snapshot"
    }

    fn open(&self, viewport: &Viewport) -> Result<SnapshotSurface> {
        Ok(SnapshotSurface {
            snapshot: Arc::clone(&self.snapshot),
            viewport: *viewport,
            paper: self.paper,
            loaded: false,
            text_hidden: false,
        })
    }
}

/// Surface produced by [`SnapshotEngine`].
#[derive(Debug)]
pub struct SnapshotSurface {
    snapshot: Arc<RenderSnapshot>,
    viewport: Viewport,
    paper: RgbColor,
    loaded: bool,
    text_hidden: bool,
}

impl SnapshotSurface {
    /// Viewport this surface was opened with.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Whether [`RenderSurface::hide_text`] has been applied.
    pub fn is_text_hidden(&self) -> bool {
        self.text_hidden
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(Error::Render("no document loaded".to_string()))
        }
    }
}

impl RenderSurface for SnapshotSurface {
    fn load_html(&mut self, _html: &str, _timeout: Duration) -> Result<()> {
        self.loaded = true;
        Ok(())
    }

    fn text_nodes(&mut self) -> Result<Vec<RawTextNode>> {
        self.ensure_loaded()?;
        Ok(self.snapshot.nodes.clone())
    }

    fn scroll_height(&mut self) -> Result<f64> {
        self.ensure_loaded()?;
        Ok(self.snapshot.scroll_height)
    }

    fn hide_text(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        self.text_hidden = true;
        Ok(())
    }

    fn capture(&mut self, clip: &ClipRegion, format: ImageFormat) -> Result<Vec<u8>> {
        self.ensure_loaded()?;
        let (width, height) = clip.device_size();
        let RgbColor(r, g, b) = self.paper;
        let canvas: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([r, g, b]));
        encode_raster(&canvas, format)
    }
}

fn encode_raster(canvas: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoded = match format {
        ImageFormat::Jpeg { quality } => {
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(canvas)
        }
        ImageFormat::Png => PngEncoder::new(&mut buf).write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgb8,
        ),
    };
    encoded.map_err(|e| Error::Render(format!("raster encoding failed: {}", e)))?;
    Ok(buf)
}
