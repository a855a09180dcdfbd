//! Document model types.
//!
//! This module defines the intermediate representation shared by the
//! pipeline stages: layout items measured from the rendered page, page
//! frames that group them, and the flow document that gets serialized.

mod document;
mod item;
mod page;
mod paragraph;
mod resource;

pub use document::{BackgroundImage, Document, Metadata, Section};
pub use item::{Alignment, LayoutItem, Rect, RgbColor, StyleSnapshot};
pub use page::{Orientation, PageFormat, PageFrame, PageSize};
pub use paragraph::{Paragraph, ParagraphStyle, TextRun, TextStyle};
pub use resource::Resource;
