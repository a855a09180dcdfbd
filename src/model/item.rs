//! Layout items: rendered text runs with geometry and resolved style.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An axis-aligned box in document coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Vertical center, the pagination key.
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Check if the box has no area.
    ///
    /// NaN never compares greater than zero, so a NaN dimension counts as empty.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    /// Black, the fallback for unparseable colors.
    pub const BLACK: RgbColor = RgbColor(0, 0, 0);

    /// Six lowercase hex digits, two per channel (e.g. `"ff0080"`).
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Parse six hex digits, with or without a leading `#`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('#');
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(RgbColor(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RgbColor::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {}", s)))
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// Map a CSS `text-align` value. Unrecognized values are left-aligned.
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            "justify" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

/// Typed snapshot of the computed style that matters for a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    /// Font size in CSS pixels
    pub font_size: f64,

    /// Font family as resolved by the engine
    pub font_family: String,

    /// Text color
    pub color: RgbColor,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Horizontal alignment
    pub alignment: Alignment,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            font_family: String::new(),
            color: RgbColor::BLACK,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
        }
    }
}

/// One visually distinct run of rendered text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    /// Trimmed, non-empty text content
    pub text: String,

    /// Tight bounding box in document coordinates
    pub rect: Rect,

    /// Distance from the bottom of the previous accepted item, never negative
    pub vertical_gap: f64,

    /// Resolved style
    pub style: StyleSnapshot,
}

impl LayoutItem {
    /// Create an item with the default style and no gap.
    pub fn new(text: impl Into<String>, rect: Rect) -> Self {
        Self {
            text: text.into(),
            rect,
            vertical_gap: 0.0,
            style: StyleSnapshot::default(),
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: StyleSnapshot) -> Self {
        self.style = style;
        self
    }

    /// Set the vertical gap.
    pub fn with_gap(mut self, gap: f64) -> Self {
        self.vertical_gap = gap;
        self
    }

    /// Vertical center of the item.
    pub fn center_y(&self) -> f64 {
        self.rect.center_y()
    }
}
