//! Document converter module.
//!
//! A [`DocumentConverter`] turns HTML into an output document. Converters
//! are registered by name in a [`ConverterRegistry`]; the high-fidelity
//! converter is generic over the [`RenderEngine`](crate::surface::RenderEngine)
//! that lays out and rasterizes the page.
//!
//! # Example
//!
//! ```no_run
//! use flowpage::convert::{ConvertOptions, ConverterRegistry, HighFidelityConverter};
//! use flowpage::surface::SnapshotEngine;
//! use std::sync::Arc;
//!
//! fn main() -> flowpage::Result<()> {
//!     let engine = SnapshotEngine::from_path("measurement.json")?;
//!     let mut registry = ConverterRegistry::new();
//!     registry.register(Arc::new(HighFidelityConverter::new(engine)));
//!
//!     let result = registry.convert("docx-hifi", "<p>Hello</p>", &ConvertOptions::default())?;
//!     result.save("hello.docx")?;
//!     Ok(())
//! }
//! ```

mod hifi;
mod pdf;

pub use hifi::HighFidelityConverter;
#[cfg(feature = "chrome")]
pub use pdf::PdfConverter;
pub use pdf::{count_pdf_pages, PrintPaper, PDF_MIME, PRINT_CSS};

use crate::detect::read_html_file;
use crate::error::{Error, Result};
use crate::model::{Metadata, Orientation, PageFormat, PageSize};
use crate::render::ConversionStats;
use crate::surface::ImageFormat;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Options for HTML conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Page format
    pub format: PageFormat,

    /// Page orientation (ignored for slides)
    pub orientation: Orientation,

    /// Device pixels per CSS pixel for background captures
    pub device_scale_factor: f64,

    /// Encoding of background captures
    pub image_format: ImageFormat,

    /// Upper bound on page load
    pub load_timeout: Duration,

    /// Pause after hiding text, before the first capture
    pub settle_delay: Duration,

    /// Font family forced on every run
    pub fallback_font: String,

    /// Document title written to the package metadata
    pub title: Option<String>,

    /// Compose pages in parallel
    pub parallel: bool,

    /// Cancellation token checked between stages
    pub cancel: Option<CancellationToken>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            orientation: Orientation::Portrait,
            device_scale_factor: 2.0,
            image_format: ImageFormat::default(),
            load_timeout: Duration::from_secs(60),
            settle_delay: Duration::from_millis(200),
            fallback_font: "Arial".to_string(),
            title: None,
            parallel: true,
            cancel: None,
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page format.
    pub fn with_format(mut self, format: PageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Shorthand for landscape orientation.
    pub fn landscape(self) -> Self {
        self.with_orientation(Orientation::Landscape)
    }

    /// Set the capture scale factor.
    pub fn with_device_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    /// Set background image encoding.
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the page load timeout.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Set the delay between hiding text and capturing.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the font used for every run.
    pub fn with_fallback_font(mut self, font: impl Into<String>) -> Self {
        self.fallback_font = font.into();
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Disable parallel page composition.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Resolved page size.
    pub fn page_size(&self) -> PageSize {
        PageSize::resolve(self.format, self.orientation)
    }

    /// Document metadata for these options.
    pub fn metadata(&self) -> Metadata {
        let metadata = Metadata::now();
        match &self.title {
            Some(title) => metadata.with_title(title.clone()),
            None => metadata,
        }
    }

    /// Reject settings no render surface can honor.
    pub fn validate(&self) -> Result<()> {
        if !(self.device_scale_factor.is_finite() && self.device_scale_factor > 0.0) {
            return Err(Error::InvalidInput(format!(
                "device scale factor must be positive, got {}",
                self.device_scale_factor
            )));
        }
        if let ImageFormat::Jpeg { quality } = self.image_format {
            if quality == 0 || quality > 100 {
                return Err(Error::InvalidInput(format!(
                    "JPEG quality must be within 1-100, got {}",
                    quality
                )));
            }
        }
        if self.fallback_font.trim().is_empty() {
            return Err(Error::InvalidInput("fallback font cannot be empty".into()));
        }
        Ok(())
    }

    /// Fail with [`Error::Cancelled`] if the token has fired.
    pub fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

/// Shared flag to stop a running conversion at the next stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Result of a conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Encoded output document
    pub data: Vec<u8>,

    /// MIME type of the output
    pub mime_type: &'static str,

    /// Metadata written into the output
    pub metadata: Metadata,

    /// Conversion statistics
    pub stats: ConversionStats,
}

impl ConvertResult {
    /// Create a new conversion result.
    pub fn new(data: Vec<u8>, mime_type: &'static str, metadata: Metadata) -> Self {
        Self {
            data,
            mime_type,
            metadata,
            stats: ConversionStats::default(),
        }
    }

    /// Set statistics.
    pub fn with_stats(mut self, stats: ConversionStats) -> Self {
        self.stats = stats;
        self
    }

    /// Number of output pages.
    pub fn page_count(&self) -> usize {
        self.stats.page_count as usize
    }

    /// Output size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the output is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the output to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Trait for HTML converters.
pub trait DocumentConverter: Send + Sync {
    /// Registry name of this converter.
    fn name(&self) -> &str;

    /// Alternative names.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// MIME type of the produced documents.
    fn mime_type(&self) -> &'static str;

    /// Convert HTML text.
    fn convert(&self, html: &str, options: &ConvertOptions) -> Result<ConvertResult>;

    /// Convert an HTML file.
    fn convert_file(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let html = read_html_file(path)?;
        self.convert(&html, options)
    }
}

/// Registry of converters by name.
pub struct ConverterRegistry {
    by_name: HashMap<String, Arc<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the converters available in this build.
    ///
    /// With the `chrome` feature this registers the Chromium-backed
    /// high-fidelity DOCX converter and the PDF printer; otherwise the
    /// registry starts empty.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "chrome")]
        {
            registry.register(Arc::new(HighFidelityConverter::new(
                crate::surface::ChromeEngine::new(),
            )));
            registry.register(Arc::new(PdfConverter::default()));
        }
        registry
    }

    /// Register a converter under its name and aliases.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        for alias in converter.aliases() {
            self.by_name
                .insert(alias.to_lowercase(), Arc::clone(&converter));
        }
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if a name is registered.
    pub fn supports(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// All registered names and aliases, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Convert HTML with the named converter.
    pub fn convert(
        &self,
        name: &str,
        html: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let converter = self
            .get(name)
            .ok_or_else(|| Error::UnknownConverter(name.to_string()))?;
        converter.convert(html, options)
    }

    /// Convert an HTML file with the named converter.
    pub fn convert_file(
        &self,
        name: &str,
        path: &Path,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let converter = self
            .get(name)
            .ok_or_else(|| Error::UnknownConverter(name.to_string()))?;
        converter.convert_file(path, options)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
