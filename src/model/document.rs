//! Document-level types.

use super::{PageSize, Paragraph, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The assembled flow document: one section per output page.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Document metadata (title, creation time)
    pub metadata: Metadata,

    /// Page sections in output order
    pub sections: Vec<Section>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with the given metadata.
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata,
            sections: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.sections.len()
    }

    /// Add a section.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Check if the document has any sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of text paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.sections.iter().map(|s| s.paragraphs.len()).sum()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// One page of the flow document.
///
/// Children are rendered as `[background, ...paragraphs]`; the page carries
/// no margins, all positioning lives in paragraph indent and spacing.
#[derive(Debug, Clone)]
pub struct Section {
    /// Page dimensions in pixels
    pub page_size: PageSize,

    /// Full-bleed background drawn behind the text
    pub background: BackgroundImage,

    /// Text paragraphs in paint order
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    /// Create a section with no text.
    pub fn new(page_size: PageSize, background: BackgroundImage) -> Self {
        Self {
            page_size,
            background,
            paragraphs: Vec::new(),
        }
    }

    /// Add a paragraph.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Get plain text content of the section.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A behind-text image covering the whole page canvas.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    /// Encoded image data
    pub resource: Resource,

    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,
}

impl BackgroundImage {
    /// Create a background covering a page of the given size.
    pub fn full_page(resource: Resource, size: PageSize) -> Self {
        Self {
            resource,
            width: size.width,
            height: size.height,
        }
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata stamped with the current time and this library as creator.
    pub fn now() -> Self {
        Self {
            title: None,
            creator: Some(format!("flowpage {}", env!("CARGO_PKG_VERSION"))),
            created: Some(Utc::now()),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRun;

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_document_plain_text() {
        let bg = BackgroundImage::full_page(Resource::png(Vec::new()), PageSize::SLIDE);
        let mut first = Section::new(PageSize::SLIDE, bg.clone());
        first.add_paragraph(Paragraph::new(TextRun::new("One")));
        first.add_paragraph(Paragraph::new(TextRun::new("Two")));
        let mut second = Section::new(PageSize::SLIDE, bg);
        second.add_paragraph(Paragraph::new(TextRun::new("Three")));

        let mut doc = Document::new();
        doc.add_section(first);
        doc.add_section(second);

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.paragraph_count(), 3);
        assert_eq!(doc.plain_text(), "One\nTwo\n\nThree");
    }

    #[test]
    fn test_metadata_now() {
        let metadata = Metadata::now().with_title("Report");
        assert_eq!(metadata.title.as_deref(), Some("Report"));
        assert!(metadata.created.is_some());
        assert!(metadata.creator.unwrap().starts_with("flowpage"));
    }
}
