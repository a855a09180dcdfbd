//! High-fidelity HTML to DOCX conversion.
//!
//! The page is rendered once at the page-format viewport. Text nodes are
//! measured and turned into flow paragraphs; the same page, with its text
//! painted transparent, is captured slice by slice as page backgrounds.
//! The render surface is dropped before compositing starts, on success and
//! on every error path.

use super::{ConvertOptions, ConvertResult, DocumentConverter};
use crate::detect::validate_html;
use crate::error::{Error, Result};
use crate::layout::{build_frames, compose, extract, Pagination};
use crate::model::{Document, LayoutItem, PageSize, Resource};
use crate::render::{ConversionStats, DocxWriter, LayoutReport, DOCX_MIME};
use crate::surface::{ClipRegion, RenderEngine, RenderSnapshot, RenderSurface, Viewport};
use std::time::Instant;

/// Everything the render stage hands to compositing.
struct Rendered {
    node_count: usize,
    items: Vec<LayoutItem>,
    pagination: Pagination,
    backgrounds: Vec<Resource>,
}

/// Converter that rebuilds a rendered page as paginated flow text over
/// per-page background images.
#[derive(Debug, Clone)]
pub struct HighFidelityConverter<E> {
    engine: E,
}

impl<E: RenderEngine> HighFidelityConverter<E> {
    /// Create a converter using `engine` for layout and rasterization.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// The render engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the pipeline up to the assembled flow document.
    pub fn to_document(
        &self,
        html: &str,
        options: &ConvertOptions,
    ) -> Result<(Document, ConversionStats)> {
        let started = Instant::now();
        validate_html(html)?;
        options.validate()?;

        let page_size = options.page_size();
        log::info!(
            "high-fidelity conversion via {} ({}x{} px, {} bytes of HTML)",
            self.engine.name(),
            page_size.width,
            page_size.height,
            html.len()
        );

        let rendered = self
            .render_stage(html, options, page_size)
            .map_err(Error::into_conversion)?;
        let render_time = started.elapsed();

        let mut stats = ConversionStats {
            node_count: rendered.node_count as u32,
            item_count: rendered.items.len() as u32,
            total_height: rendered.pagination.total_height,
            render_time,
            ..Default::default()
        };

        options.check_cancelled()?;
        let frames = build_frames(&rendered.pagination, rendered.items, rendered.backgrounds)?;
        let sections = compose(frames, &options.fallback_font, options.parallel);

        let mut doc = Document::with_metadata(options.metadata());
        for section in sections {
            doc.add_section(section);
        }
        stats.record_document(&doc);
        stats.total_time = started.elapsed();

        Ok((doc, stats))
    }

    /// Convert HTML to DOCX bytes.
    pub fn convert_html(&self, html: &str, options: &ConvertOptions) -> Result<ConvertResult> {
        let started = Instant::now();
        let (doc, mut stats) = self.to_document(html, options)?;

        options.check_cancelled()?;
        log::info!("assembling {} pages", doc.page_count());
        let data = DocxWriter::new()
            .with_default_font(options.fallback_font.clone())
            .to_bytes(&doc)?;

        stats.total_time = started.elapsed();
        log::info!(
            "conversion finished: {} pages, {} paragraphs, {} bytes",
            stats.page_count,
            stats.paragraph_count,
            data.len()
        );

        Ok(ConvertResult::new(data, DOCX_MIME, doc.metadata).with_stats(stats))
    }

    /// Measure and paginate without capturing or assembling.
    pub fn inspect(&self, html: &str, options: &ConvertOptions) -> Result<LayoutReport> {
        validate_html(html)?;
        options.validate()?;
        let page_size = options.page_size();

        let (items, pagination) = (|| -> Result<_> {
            options.check_cancelled()?;
            let mut surface = self.open_loaded(html, options, page_size)?;
            let (_, items, pagination) = measure(&mut surface, page_size)?;
            Ok((items, pagination))
        })()
        .map_err(Error::into_conversion)?;

        Ok(LayoutReport::new(&pagination, &items))
    }

    /// Record the raw measurement of `html` for later replay.
    pub fn record(&self, html: &str, options: &ConvertOptions) -> Result<RenderSnapshot> {
        validate_html(html)?;
        options.validate()?;

        (|| -> Result<RenderSnapshot> {
            let mut surface = self.open_loaded(html, options, options.page_size())?;
            let scroll_height = surface.scroll_height()?;
            let nodes = surface.text_nodes()?;
            Ok(RenderSnapshot::new(scroll_height, nodes))
        })()
        .map_err(Error::into_conversion)
    }

    fn open_loaded(
        &self,
        html: &str,
        options: &ConvertOptions,
        page_size: PageSize,
    ) -> Result<E::Surface> {
        let viewport = Viewport::for_page(page_size, options.device_scale_factor);
        let mut surface = self.engine.open(&viewport)?;
        surface.load_html(html, options.load_timeout)?;
        Ok(surface)
    }

    fn render_stage(
        &self,
        html: &str,
        options: &ConvertOptions,
        page_size: PageSize,
    ) -> Result<Rendered> {
        options.check_cancelled()?;
        let mut surface = self.open_loaded(html, options, page_size)?;
        let (node_count, items, pagination) = measure(&mut surface, page_size)?;
        log::info!(
            "{} layout items over {} pages",
            items.len(),
            pagination.page_count()
        );

        options.check_cancelled()?;
        surface.hide_text()?;
        if !options.settle_delay.is_zero() {
            std::thread::sleep(options.settle_delay);
        }

        let mut backgrounds = Vec::with_capacity(pagination.page_count());
        for slice in &pagination.pages {
            options.check_cancelled()?;
            let clip = ClipRegion::for_page(slice.index, page_size, options.device_scale_factor);
            let bytes = surface.capture(&clip, options.image_format)?;
            log::debug!("captured page {} ({} bytes)", slice.index + 1, bytes.len());
            backgrounds.push(Resource::sniffed(bytes, options.image_format.mime_type()));
        }

        Ok(Rendered {
            node_count,
            items,
            pagination,
            backgrounds,
        })
    }
}

fn measure<S: RenderSurface>(
    surface: &mut S,
    page_size: PageSize,
) -> Result<(usize, Vec<LayoutItem>, Pagination)> {
    let nodes = surface.text_nodes()?;
    let node_count = nodes.len();
    let items = extract(nodes);
    let scroll_height = surface.scroll_height()?;
    let pagination = Pagination::paginate(page_size, scroll_height, &items);
    Ok((node_count, items, pagination))
}

impl<E: RenderEngine + 'static> DocumentConverter for HighFidelityConverter<E> {
    fn name(&self) -> &str {
        "docx-hifi"
    }

    fn aliases(&self) -> &[&str] {
        &["hifi", "docx"]
    }

    fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }

    fn convert(&self, html: &str, options: &ConvertOptions) -> Result<ConvertResult> {
        self.convert_html(html, options)
    }
}
