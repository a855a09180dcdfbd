//! Page compositing: pair each page background with its items and turn
//! absolute pixel geometry into flow spacing and indentation.

use super::paginate::Pagination;
use crate::error::{Error, Result};
use crate::model::{
    BackgroundImage, LayoutItem, PageFrame, Paragraph, ParagraphStyle, Resource, Section,
    TextRun, TextStyle,
};
use crate::units::{px_to_half_point, px_to_twip};
use rayon::prelude::*;

/// Move items into page frames according to `pagination`.
///
/// `backgrounds` must hold exactly one capture per page, in page order.
pub fn build_frames(
    pagination: &Pagination,
    items: Vec<LayoutItem>,
    backgrounds: Vec<Resource>,
) -> Result<Vec<PageFrame>> {
    if backgrounds.len() != pagination.page_count() {
        return Err(Error::Other(format!(
            "expected {} page backgrounds, got {}",
            pagination.page_count(),
            backgrounds.len()
        )));
    }

    let mut slots: Vec<Option<LayoutItem>> = items.into_iter().map(Some).collect();
    let mut frames = Vec::with_capacity(pagination.page_count());

    for (slice, background) in pagination.pages.iter().zip(backgrounds) {
        let mut frame = PageFrame::new(slice.index, pagination.page_size, background);
        for &i in &slice.items {
            let item = slots
                .get_mut(i)
                .and_then(Option::take)
                .ok_or_else(|| Error::Other(format!("layout item {} assigned twice", i)))?;
            frame.items.push(item);
        }
        frames.push(frame);
    }

    Ok(frames)
}

/// Convert one frame into a flow section.
pub fn compose_page(frame: PageFrame, font: &str) -> Section {
    let top = frame.top();
    let background = BackgroundImage::full_page(frame.background, frame.size);
    let mut section = Section::new(frame.size, background);

    for (n, item) in frame.items.into_iter().enumerate() {
        let offset = if n == 0 {
            item.rect.y - top
        } else {
            item.vertical_gap
        };
        section.add_paragraph(compose_item(item, offset, font));
    }

    section
}

/// Convert every frame, optionally in parallel. Page order is preserved.
pub fn compose(frames: Vec<PageFrame>, font: &str, parallel: bool) -> Vec<Section> {
    if parallel && frames.len() > 1 {
        frames
            .into_par_iter()
            .map(|frame| compose_page(frame, font))
            .collect()
    } else {
        frames
            .into_iter()
            .map(|frame| compose_page(frame, font))
            .collect()
    }
}

fn compose_item(item: LayoutItem, space_before_px: f64, font: &str) -> Paragraph {
    let style = item.style;
    let run_style = TextStyle {
        bold: style.bold,
        italic: style.italic,
        font_name: font.to_string(),
        size: px_to_half_point(style.font_size),
        color: style.color,
    };
    let paragraph_style = ParagraphStyle {
        alignment: style.alignment,
        indent_left: px_to_twip(item.rect.x),
        space_before: spacing_twips(space_before_px),
    };

    Paragraph::new(TextRun::new(item.text).with_style(run_style)).with_style(paragraph_style)
}

/// Spacing cannot be negative in the output format.
fn spacing_twips(px: f64) -> u32 {
    u32::try_from(px_to_twip(px).max(0)).unwrap_or(u32::MAX)
}
