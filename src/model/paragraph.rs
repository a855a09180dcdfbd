//! Flow paragraph and text-run types.
//!
//! Lengths here are already in flow-document units: twips for spacing and
//! indentation, half-points for font sizes.

use super::{Alignment, RgbColor};
use serde::{Deserialize, Serialize};

/// A block paragraph carrying exactly one styled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// The text run
    pub run: TextRun,

    /// Paragraph positioning
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a paragraph with default positioning.
    pub fn new(run: TextRun) -> Self {
        Self {
            run,
            style: ParagraphStyle::default(),
        }
    }

    /// Set the paragraph style.
    pub fn with_style(mut self, style: ParagraphStyle) -> Self {
        self.style = style;
        self
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> &str {
        &self.run.text
    }
}

/// Paragraph positioning properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Text alignment
    pub alignment: Alignment,

    /// Left indentation in twips (may be negative)
    pub indent_left: i64,

    /// Space before the paragraph in twips
    pub space_before: u32,
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Set the run style.
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

/// Text styling properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Font name
    pub font_name: String,

    /// Font size in half-points
    pub size: u32,

    /// Text color
    pub color: RgbColor,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            font_name: "Arial".to_string(),
            size: 24,
            color: RgbColor::BLACK,
        }
    }
}
