//! HTML to PDF through the browser's print pipeline.
//!
//! Unlike the DOCX path nothing is reconstructed: the page is loaded at a
//! wide screen viewport, a print stylesheet unclips scroll containers and
//! keeps blocks together, and Chromium paginates the result itself.

use crate::model::{Orientation, PageFormat};
use regex::bytes::Regex;
use std::sync::OnceLock;

#[cfg(feature = "chrome")]
use super::{ConvertOptions, ConvertResult, DocumentConverter};
#[cfg(feature = "chrome")]
use crate::detect::validate_html;
#[cfg(feature = "chrome")]
use crate::error::{Error, Result};
#[cfg(feature = "chrome")]
use crate::render::ConversionStats;
#[cfg(feature = "chrome")]
use crate::surface::{ChromeEngine, RenderEngine, RenderSurface, Viewport};
#[cfg(feature = "chrome")]
use std::time::Instant;

/// MIME type of printed documents.
pub const PDF_MIME: &str = "application/pdf";

/// Viewport width used while printing, in CSS pixels.
pub const PRINT_VIEWPORT_WIDTH: u32 = 1200;

/// Viewport height used while printing, in CSS pixels.
pub const PRINT_VIEWPORT_HEIGHT: u32 = 1600;

const MM_PER_INCH: f64 = 25.4;

/// Print rules injected before printing.
pub const PRINT_CSS: &str = r#"@media print {
  html, body, #root {
    height: auto !important;
    min-height: auto !important;
    max-height: none !important;
    overflow: visible !important;
  }
  [class*="overflow"], [class*="scroll"], [style*="overflow"] {
    overflow: visible !important;
  }
  table, img, svg, pre, blockquote, tr, ul, ol, li, .prevent-break, .card {
    page-break-inside: avoid !important;
    break-inside: avoid !important;
  }
  h1, h2, h3, h4, h5, h6 {
    page-break-after: avoid !important;
    break-after: avoid !important;
    page-break-inside: avoid !important;
  }
  * {
    -webkit-print-color-adjust: exact !important;
    print-color-adjust: exact !important;
  }
}"#;

/// Paper geometry handed to the print pipeline, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintPaper {
    /// Paper width before any landscape rotation
    pub width_in: f64,

    /// Paper height before any landscape rotation
    pub height_in: f64,

    /// Margin applied on all four sides
    pub margin_in: f64,

    /// Ask the printer to rotate the paper
    pub landscape: bool,
}

impl PrintPaper {
    /// A4 with 10 mm margins.
    pub const A4: PrintPaper = PrintPaper {
        width_in: 8.27,
        height_in: 11.7,
        margin_in: 10.0 / MM_PER_INCH,
        landscape: false,
    };

    /// 16:9 slide without margins. Already wider than tall, so never rotated.
    pub const SLIDE: PrintPaper = PrintPaper {
        width_in: 10.0,
        height_in: 5.625,
        margin_in: 0.0,
        landscape: false,
    };

    /// Paper for a format and orientation. Orientation only affects A4.
    pub fn resolve(format: PageFormat, orientation: Orientation) -> Self {
        match format {
            PageFormat::Slide => Self::SLIDE,
            PageFormat::A4 => PrintPaper {
                landscape: orientation == Orientation::Landscape,
                ..Self::A4
            },
        }
    }
}

/// Count page objects in a printed PDF.
///
/// Chromium writes page dictionaries uncompressed, so a scan for
/// `/Type /Page` is enough; `/Pages` tree nodes are excluded.
pub fn count_pdf_pages(data: &[u8]) -> usize {
    static PAGE: OnceLock<Regex> = OnceLock::new();
    PAGE.get_or_init(|| Regex::new(r"(?-u)/Type\s*/Page\b").expect("page pattern is valid"))
        .find_iter(data)
        .count()
}

/// Converter printing HTML to PDF with headless Chromium.
#[cfg(feature = "chrome")]
#[derive(Debug, Clone, Default)]
pub struct PdfConverter {
    engine: ChromeEngine,
}

#[cfg(feature = "chrome")]
impl PdfConverter {
    /// Create a converter printing with `engine`.
    pub fn new(engine: ChromeEngine) -> Self {
        Self { engine }
    }

    /// Convert HTML to PDF bytes.
    pub fn convert_html(&self, html: &str, options: &ConvertOptions) -> Result<ConvertResult> {
        let started = Instant::now();
        validate_html(html)?;
        options.validate()?;
        options.check_cancelled()?;

        let paper = PrintPaper::resolve(options.format, options.orientation);
        log::info!(
            "printing {} bytes of HTML on {}x{} in paper",
            html.len(),
            paper.width_in,
            paper.height_in
        );

        let data = self.print(html, options, &paper).map_err(Error::into_pdf)?;

        let stats = ConversionStats {
            page_count: count_pdf_pages(&data) as u32,
            render_time: started.elapsed(),
            total_time: started.elapsed(),
            ..Default::default()
        };
        log::info!("PDF generated ({:.1} KB)", data.len() as f64 / 1024.0);

        Ok(ConvertResult::new(data, PDF_MIME, options.metadata()).with_stats(stats))
    }

    fn print(&self, html: &str, options: &ConvertOptions, paper: &PrintPaper) -> Result<Vec<u8>> {
        let viewport = Viewport {
            width: PRINT_VIEWPORT_WIDTH,
            height: PRINT_VIEWPORT_HEIGHT,
            device_scale_factor: options.device_scale_factor,
        };
        let mut surface = self.engine.open(&viewport)?;
        surface.load_html(html, options.load_timeout)?;
        options.check_cancelled()?;
        surface.add_stylesheet(PRINT_CSS)?;
        surface.print_pdf(paper)
    }
}

#[cfg(feature = "chrome")]
impl DocumentConverter for PdfConverter {
    fn name(&self) -> &str {
        "pdf"
    }

    fn mime_type(&self) -> &'static str {
        PDF_MIME
    }

    fn convert(&self, html: &str, options: &ConvertOptions) -> Result<ConvertResult> {
        self.convert_html(html, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_paper() {
        let paper = PrintPaper::resolve(PageFormat::A4, Orientation::Portrait);
        assert_eq!((paper.width_in, paper.height_in), (8.27, 11.7));
        assert!((paper.margin_in - 0.3937).abs() < 1e-4);
        assert!(!paper.landscape);

        let paper = PrintPaper::resolve(PageFormat::A4, Orientation::Landscape);
        assert_eq!((paper.width_in, paper.height_in), (8.27, 11.7));
        assert!(paper.landscape);
    }

    #[test]
    fn test_slide_paper_ignores_orientation() {
        for orientation in [Orientation::Portrait, Orientation::Landscape] {
            let paper = PrintPaper::resolve(PageFormat::Slide, orientation);
            assert_eq!(paper, PrintPaper::SLIDE);
            assert_eq!(paper.margin_in, 0.0);
            assert!(paper.width_in > paper.height_in);
        }
    }

    #[test]
    fn test_count_pdf_pages() {
        let pdf = b"%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
            2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >> endobj\n\
            3 0 obj << /Type /Page /Parent 2 0 R >> endobj\n\
            4 0 obj << /Type/Page /Parent 2 0 R >> endobj\n\xFF\xFE";
        assert_eq!(count_pdf_pages(pdf), 2);
        assert_eq!(count_pdf_pages(b""), 0);
    }

    #[test]
    fn test_print_css_rules() {
        assert!(PRINT_CSS.starts_with("@media print"));
        assert!(PRINT_CSS.contains("overflow: visible !important"));
        assert!(PRINT_CSS.contains("print-color-adjust: exact"));
    }
}
