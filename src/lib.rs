//! # flowpage
//!
//! High-fidelity HTML to paginated DOCX conversion.
//!
//! A render engine lays the HTML out at a fixed page-sized viewport. The
//! rendered text is rebuilt as editable flow paragraphs (spacing, indent,
//! alignment), and every page gets a full-bleed background image of the
//! same page with its text hidden, so anything the flow layout cannot
//! express is still visible.
//!
//! ## Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "chrome")]
//! # fn main() -> flowpage::Result<()> {
//! use flowpage::{convert_html, ConvertOptions};
//!
//! let html = "<h1>Report</h1><p>Hello</p>";
//! let result = convert_html(html, &ConvertOptions::default())?;
//! std::fs::write("report.docx", &result.data)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "chrome"))]
//! # fn main() {}
//! ```
//!
//! Without the `chrome` feature, any [`surface::RenderEngine`] can drive the
//! pipeline, for example a [`surface::SnapshotEngine`] replaying a recorded
//! measurement:
//!
//! ```no_run
//! use flowpage::surface::SnapshotEngine;
//! use flowpage::Flowpage;
//!
//! let engine = SnapshotEngine::from_path("measurement.json")?;
//! let result = Flowpage::new()
//!     .slide()
//!     .with_title("Deck")
//!     .convert_with(&engine, "<h1>Slide</h1>")?;
//! println!("{} pages", result.page_count());
//! # Ok::<(), flowpage::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. **Render surface**: fixed viewport, raw text nodes, page captures
//! 2. **Flow extractor**: visibility filter, vertical gaps, typed styles
//! 3. **Paginator**: center-point page assignment
//! 4. **Page compositor**: indent and spacing from pixel geometry
//! 5. **Document assembler**: one zero-margin DOCX section per page
//!
//! With the `chrome` feature, `convert_html_to_pdf` offers a separate PDF
//! output that lets the browser's print pipeline paginate instead.

pub mod convert;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod render;
pub mod surface;
pub mod units;

// Re-export commonly used types
pub use convert::{
    CancellationToken, ConvertOptions, ConvertResult, ConverterRegistry, DocumentConverter,
    HighFidelityConverter,
};
pub use detect::{looks_like_html, validate_html};
pub use error::{Error, Result};
pub use model::{
    Alignment, Document, LayoutItem, Metadata, Orientation, PageFormat, PageFrame, PageSize,
    Paragraph, Rect, RgbColor, Section, StyleSnapshot,
};
pub use render::{ConversionStats, DocxWriter, JsonFormat, LayoutReport};
pub use surface::{ImageFormat, RenderEngine, RenderSnapshot, SnapshotEngine};

#[cfg(feature = "chrome")]
pub use convert::PdfConverter;
#[cfg(feature = "chrome")]
pub use surface::ChromeEngine;

use std::path::Path;

/// Convert HTML to DOCX with the given render engine.
pub fn convert_html_with<E: RenderEngine>(
    engine: E,
    html: &str,
    options: &ConvertOptions,
) -> Result<ConvertResult> {
    HighFidelityConverter::new(engine).convert_html(html, options)
}

/// Convert HTML to DOCX using headless Chromium.
///
/// # Example
///
/// ```no_run
/// use flowpage::{convert_html, ConvertOptions, PageFormat};
///
/// let options = ConvertOptions::new().with_format(PageFormat::Slide);
/// let result = convert_html("<h1>Title</h1>", &options).unwrap();
/// assert_eq!(result.mime_type, flowpage::render::DOCX_MIME);
/// ```
#[cfg(feature = "chrome")]
pub fn convert_html(html: &str, options: &ConvertOptions) -> Result<ConvertResult> {
    convert_html_with(ChromeEngine::new(), html, options)
}

/// Convert an HTML file to DOCX using headless Chromium.
#[cfg(feature = "chrome")]
pub fn convert_html_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<ConvertResult> {
    let html = detect::read_html_file(path)?;
    convert_html(&html, options)
}

/// Print HTML to PDF using headless Chromium.
///
/// The browser paginates on its own; see [`convert::PrintPaper`] for the paper used.
#[cfg(feature = "chrome")]
pub fn convert_html_to_pdf(html: &str, options: &ConvertOptions) -> Result<ConvertResult> {
    PdfConverter::default().convert_html(html, options)
}

/// Measure and paginate HTML using headless Chromium, without capturing.
#[cfg(feature = "chrome")]
pub fn inspect_html(html: &str, options: &ConvertOptions) -> Result<LayoutReport> {
    HighFidelityConverter::new(ChromeEngine::new()).inspect(html, options)
}

/// Builder for HTML to DOCX conversions.
///
/// # Example
///
/// ```no_run
/// use flowpage::surface::SnapshotEngine;
/// use flowpage::Flowpage;
///
/// let engine = SnapshotEngine::from_path("measurement.json")?;
/// Flowpage::new()
///     .landscape()
///     .png()
///     .convert_with(&engine, "<p>Wide</p>")?
///     .save("wide.docx")?;
/// # Ok::<(), flowpage::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Flowpage {
    options: ConvertOptions,
}

impl Flowpage {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Use the slide page format.
    pub fn slide(mut self) -> Self {
        self.options = self.options.with_format(PageFormat::Slide);
        self
    }

    /// Use landscape orientation.
    pub fn landscape(mut self) -> Self {
        self.options = self.options.landscape();
        self
    }

    /// Capture backgrounds as PNG.
    pub fn png(mut self) -> Self {
        self.options = self.options.with_image_format(ImageFormat::Png);
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options = self.options.with_title(title);
        self
    }

    /// Set the font used for every run.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.options = self.options.with_fallback_font(font);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.options = self.options.with_cancel(token);
        self
    }

    /// Disable parallel page composition.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// The accumulated options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert HTML with the given engine.
    pub fn convert_with<E: RenderEngine + Clone>(&self, engine: &E, html: &str) -> Result<ConvertResult> {
        convert_html_with(engine.clone(), html, &self.options)
    }

    /// Convert an HTML file with the given engine.
    pub fn convert_file_with<E: RenderEngine + Clone, P: AsRef<Path>>(
        &self,
        engine: &E,
        path: P,
    ) -> Result<ConvertResult> {
        let html = detect::read_html_file(path)?;
        self.convert_with(engine, &html)
    }

    /// Measure and paginate with the given engine.
    pub fn inspect_with<E: RenderEngine + Clone>(&self, engine: &E, html: &str) -> Result<LayoutReport> {
        HighFidelityConverter::new(engine.clone()).inspect(html, &self.options)
    }

    /// Convert HTML using headless Chromium.
    #[cfg(feature = "chrome")]
    pub fn convert(&self, html: &str) -> Result<ConvertResult> {
        convert_html(html, &self.options)
    }

    /// Convert an HTML file using headless Chromium.
    #[cfg(feature = "chrome")]
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<ConvertResult> {
        convert_html_file(path, &self.options)
    }

    /// Print HTML to PDF using headless Chromium.
    #[cfg(feature = "chrome")]
    pub fn convert_pdf(&self, html: &str) -> Result<ConvertResult> {
        convert_html_to_pdf(html, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_options() {
        let builder = Flowpage::new().slide().png().with_title("Deck").sequential();
        let options = builder.options();
        assert_eq!(options.page_size(), PageSize::SLIDE);
        assert_eq!(options.image_format, ImageFormat::Png);
        assert_eq!(options.title.as_deref(), Some("Deck"));
        assert!(!options.parallel);
    }

    #[test]
    fn test_builder_landscape() {
        let builder = Flowpage::new().landscape().with_font("Helvetica");
        assert_eq!(builder.options().page_size(), PageSize::new(1123, 794));
        assert_eq!(builder.options().fallback_font, "Helvetica");
    }

    #[test]
    fn test_convert_with_rejects_plain_text() {
        let engine = SnapshotEngine::new(RenderSnapshot::default());
        let err = Flowpage::new()
            .convert_with(&engine, "just some words")
            .unwrap_err();
        assert!(err.is_invalid_input());
    }
}
