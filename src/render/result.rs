//! Conversion statistics.

use crate::model::Document;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistics collected during a conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Raw text nodes reported by the render surface
    pub node_count: u32,

    /// Layout items that survived filtering
    pub item_count: u32,

    /// Output pages
    pub page_count: u32,

    /// Paragraphs written (text only, backgrounds excluded)
    pub paragraph_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,

    /// Total bytes of captured page backgrounds
    pub image_bytes: u64,

    /// Measured content height in pixels
    pub total_height: f64,

    /// Time spent rendering, measuring and capturing
    pub render_time: Duration,

    /// Total wall time
    pub total_time: Duration,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Record the content of an assembled document.
    pub fn record_document(&mut self, doc: &Document) {
        for section in &doc.sections {
            self.add_page();
            self.image_bytes += section.background.resource.size() as u64;
            for para in &section.paragraphs {
                self.paragraph_count += 1;
                self.count_text(para.plain_text());
            }
        }
    }

    /// Items dropped by the visibility filter.
    pub fn filtered_count(&self) -> u32 {
        self.node_count.saturating_sub(self.item_count)
    }
}
