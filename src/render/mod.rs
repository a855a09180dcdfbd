//! Output writers: the DOCX document assembler and the JSON layout report.

mod docx;
mod json;
mod result;

pub use docx::{to_docx, DocxWriter, DOCX_MIME};
pub use json::{to_json, JsonFormat, LayoutReport, PageReport};
pub use result::ConversionStats;
