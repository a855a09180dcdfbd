//! Flow extraction: raw rendered text nodes into ordered layout items.
//!
//! This is a pure filter and order-preserving transform. It knows nothing
//! about pages; the only state carried across nodes is the [`GapCursor`].

use crate::model::{Alignment, LayoutItem, RgbColor, StyleSnapshot};
use crate::surface::{ComputedStyle, RawTextNode};
use regex::Regex;
use std::sync::OnceLock;

/// Parent elements whose text never renders.
const NON_RENDERED_PARENTS: &[&str] = &["SCRIPT", "STYLE", "NOSCRIPT"];

/// Font size used when the computed value cannot be parsed.
const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"rgba?\(\s*(\d+(?:\.\d+)?)[\s,]+(\d+(?:\.\d+)?)[\s,]+(\d+(?:\.\d+)?)")
            .expect("valid regex")
    })
}

/// Running "last bottom" accumulator for vertical gaps.
///
/// Only accepted items advance the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GapCursor {
    last_bottom: f64,
}

impl GapCursor {
    /// A cursor positioned at the document top.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bottom edge of the last accepted item.
    pub fn last_bottom(&self) -> f64 {
        self.last_bottom
    }

    /// Gap from the last accepted item to `top`, clamped to zero.
    pub fn gap_to(&self, top: f64) -> f64 {
        let gap = top - self.last_bottom;
        if gap > 0.0 {
            gap
        } else {
            0.0
        }
    }

    /// Record an accepted item and return its gap.
    pub fn advance(&mut self, top: f64, bottom: f64) -> f64 {
        let gap = self.gap_to(top);
        self.last_bottom = bottom;
        gap
    }
}

/// Why a raw node did not become a layout item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Only whitespace
    Blank,
    /// Parent is a script, style or noscript element
    NonRenderedParent,
    /// Selection box has zero width or height
    ZeroArea,
    /// `display: none`
    DisplayNone,
    /// `visibility: hidden`
    Hidden,
    /// `opacity: 0`
    Transparent,
}

/// Decide whether a raw node is visible text.
pub fn check_node(node: &RawTextNode) -> Result<(), Rejection> {
    if node.text.trim().is_empty() {
        return Err(Rejection::Blank);
    }
    if let Some(tag) = &node.parent_tag {
        if NON_RENDERED_PARENTS
            .iter()
            .any(|t| tag.eq_ignore_ascii_case(t))
        {
            return Err(Rejection::NonRenderedParent);
        }
    }
    if node.rect.is_empty() {
        return Err(Rejection::ZeroArea);
    }
    if let Some(style) = &node.style {
        if style.display.trim().eq_ignore_ascii_case("none") {
            return Err(Rejection::DisplayNone);
        }
        if style.visibility.trim().eq_ignore_ascii_case("hidden") {
            return Err(Rejection::Hidden);
        }
        if let Ok(opacity) = style.opacity.trim().parse::<f64>() {
            if opacity <= 0.0 {
                return Err(Rejection::Transparent);
            }
        }
    }
    Ok(())
}

/// Extract layout items from raw nodes, preserving their order.
pub fn extract(nodes: Vec<RawTextNode>) -> Vec<LayoutItem> {
    let mut cursor = GapCursor::new();
    let total = nodes.len();
    let items: Vec<LayoutItem> = nodes
        .into_iter()
        .filter_map(|node| extract_node(node, &mut cursor))
        .collect();
    log::debug!("extracted {} layout items from {} text nodes", items.len(), total);
    items
}

/// Extract a single node, advancing `cursor` when it is accepted.
pub fn extract_node(node: RawTextNode, cursor: &mut GapCursor) -> Option<LayoutItem> {
    if let Err(reason) = check_node(&node) {
        log::debug!("skipping text node {:?}: {:?}", truncate(&node.text), reason);
        return None;
    }

    let style = node
        .style
        .as_ref()
        .map(StyleSnapshot::from_computed)
        .unwrap_or_default();
    let gap = cursor.advance(node.rect.y, node.rect.bottom());

    Some(
        LayoutItem::new(node.text.trim(), node.rect)
            .with_style(style)
            .with_gap(gap),
    )
}

fn truncate(text: &str) -> String {
    text.trim().chars().take(24).collect()
}

impl StyleSnapshot {
    /// Interpret computed CSS strings.
    ///
    /// This is the only place raw style text is parsed. Anything that does
    /// not parse falls back to the default for that property.
    pub fn from_computed(style: &ComputedStyle) -> Self {
        Self {
            font_size: parse_font_size(&style.font_size),
            font_family: style.font_family.trim().to_string(),
            color: parse_color(&style.color),
            bold: is_bold(&style.font_weight),
            italic: is_italic(&style.font_style),
            alignment: Alignment::from_css(&style.text_align),
        }
    }
}

/// Parse an `rgb()`/`rgba()` triple or a `#rrggbb` value. Falls back to black.
pub fn parse_color(value: &str) -> RgbColor {
    let value = value.trim();
    if let Some(caps) = rgb_regex().captures(value) {
        let channel = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|v| v.round().clamp(0.0, 255.0) as u8)
                .unwrap_or(0)
        };
        return RgbColor(channel(1), channel(2), channel(3));
    }
    RgbColor::from_hex(value).unwrap_or(RgbColor::BLACK)
}

/// Parse a computed font size such as `"16px"`.
pub fn parse_font_size(value: &str) -> f64 {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(px) if px.is_finite() && px >= 0.0 => px,
        _ => {
            if !trimmed.is_empty() {
                log::warn!("unparseable font size {:?}, using default", trimmed);
            }
            DEFAULT_FONT_SIZE_PX
        }
    }
}

/// `bold`, `bolder`, or a numeric weight of 600 and above.
pub fn is_bold(weight: &str) -> bool {
    let weight = weight.trim();
    if weight.eq_ignore_ascii_case("bold") || weight.eq_ignore_ascii_case("bolder") {
        return true;
    }
    weight.parse::<f64>().map(|w| w >= 600.0).unwrap_or(false)
}

fn is_italic(style: &str) -> bool {
    let style = style.trim().to_ascii_lowercase();
    style == "italic" || style.starts_with("oblique")
}
