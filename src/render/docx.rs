//! WordprocessingML (DOCX) package writer.
//!
//! Each [`Section`] becomes one page section with zero margins. Its first
//! paragraph anchors the page background behind the text; the remaining
//! paragraphs carry one run each, positioned only by spacing and indent.

use crate::error::{Error, Result};
use crate::model::{Alignment, Document, PageSize, Paragraph, Section};
use crate::units::{px_to_emu, px_to_twip};
use chrono::SecondsFormat;
use quick_xml::escape::escape;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// MIME type of the generated package.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// First relationship id used for page images; 1 and 2 are styles and settings.
const FIRST_IMAGE_RID: usize = 3;

/// Writer for DOCX packages.
#[derive(Debug, Clone)]
pub struct DocxWriter {
    default_font: String,
    compression: CompressionMethod,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self {
            default_font: "Arial".to_string(),
            compression: CompressionMethod::Deflated,
        }
    }
}

impl DocxWriter {
    /// Create a writer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Font declared in the document defaults.
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = font.into();
        self
    }

    /// Store parts uncompressed.
    pub fn stored(mut self) -> Self {
        self.compression = CompressionMethod::Stored;
        self
    }

    /// Serialize `doc` into an in-memory package.
    pub fn to_bytes(&self, doc: &Document) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(doc, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Serialize `doc` into any seekable writer.
    pub fn write<W: Write + Seek>(&self, doc: &Document, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(self.compression);
        let media = media_parts(doc);

        put(&mut zip, "[Content_Types].xml", &content_types_xml(&media), options)?;
        put(&mut zip, "_rels/.rels", PACKAGE_RELS, options)?;
        put(&mut zip, "docProps/core.xml", &core_xml(doc), options)?;
        put(&mut zip, "docProps/app.xml", &app_xml(doc), options)?;
        put(&mut zip, "word/document.xml", &document_xml(doc, &media), options)?;
        put(&mut zip, "word/styles.xml", &styles_xml(&self.default_font), options)?;
        put(&mut zip, "word/settings.xml", SETTINGS_XML, options)?;
        put(
            &mut zip,
            "word/_rels/document.xml.rels",
            &document_rels_xml(&media),
            options,
        )?;

        // Rasters are already compressed.
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (part, section) in media.iter().zip(&doc.sections) {
            zip.start_file(format!("word/{}", part.target), stored)?;
            zip.write_all(&section.background.resource.data)
                .map_err(|e| Error::Serialization(format!("writing {}: {}", part.target, e)))?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize `doc` to a file.
    pub fn save<P: AsRef<Path>>(&self, doc: &Document, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(doc, file)
    }
}

/// Serialize a document to DOCX bytes with default settings.
pub fn to_docx(doc: &Document) -> Result<Vec<u8>> {
    DocxWriter::new().to_bytes(doc)
}

fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)?;
    zip.write_all(content.as_bytes())
        .map_err(|e| Error::Serialization(format!("writing {}: {}", name, e)))
}

/// One background image part.
#[derive(Debug)]
struct MediaPart {
    rid: String,
    target: String,
    extension: String,
    mime_type: String,
}

fn media_parts(doc: &Document) -> Vec<MediaPart> {
    doc.sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let resource = &section.background.resource;
            let extension = resource.extension().to_string();
            MediaPart {
                rid: format!("rId{}", FIRST_IMAGE_RID + i),
                target: format!("media/page{}.{}", i + 1, extension),
                extension,
                mime_type: resource.mime_type.clone(),
            }
        })
        .collect()
}

fn content_types_xml(media: &[MediaPart]) -> String {
    let defaults: BTreeMap<&str, &str> = media
        .iter()
        .map(|m| (m.extension.as_str(), m.mime_type.as_str()))
        .collect();

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
"#,
    );
    for (ext, mime) in defaults {
        let _ = writeln!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            escape(ext),
            escape(mime)
        );
    }
    xml.push_str(
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
    );
    xml
}

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

fn document_rels_xml(media: &[MediaPart]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="{base}/styles" Target="styles.xml"/>
<Relationship Id="rId2" Type="{base}/settings" Target="settings.xml"/>
"#,
        base = REL_BASE
    );
    for part in media {
        let _ = writeln!(
            xml,
            r#"<Relationship Id="{}" Type="{}/image" Target="{}"/>"#,
            part.rid, REL_BASE, part.target
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_xml(doc: &Document) -> String {
    let meta = &doc.metadata;
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
"#,
    );
    if let Some(title) = &meta.title {
        let _ = writeln!(xml, "<dc:title>{}</dc:title>", xml_text(title));
    }
    if let Some(creator) = &meta.creator {
        let _ = writeln!(xml, "<dc:creator>{}</dc:creator>", xml_text(creator));
    }
    if let Some(created) = &meta.created {
        let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
        let _ = writeln!(
            xml,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified>"#,
            stamp
        );
    }
    xml.push_str("</cp:coreProperties>");
    xml
}

fn app_xml(doc: &Document) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>flowpage</Application>
<Pages>{}</Pages>
<Paragraphs>{}</Paragraphs>
</Properties>"#,
        doc.page_count(),
        doc.paragraph_count()
    )
}

fn styles_xml(font: &str) -> String {
    let font = xml_text(font);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{NS_W}">
<w:docDefaults>
<w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}" w:eastAsia="{font}"/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr></w:rPrDefault>
<w:pPrDefault><w:pPr><w:spacing w:before="0" w:after="0" w:line="240" w:lineRule="auto"/></w:pPr></w:pPrDefault>
</w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
</w:styles>"#
    )
}

const SETTINGS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:defaultTabStop w:val="720"/>
<w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>
</w:settings>"#;

fn document_xml(doc: &Document, media: &[MediaPart]) -> String {
    let mut body = String::new();
    let last = doc.sections.len().saturating_sub(1);

    for (i, (section, part)) in doc.sections.iter().zip(media).enumerate() {
        let sect_pr = section_properties(section.page_size);
        if i == last {
            write_section(&mut body, section, part, i, None);
            body.push_str(&sect_pr);
        } else {
            write_section(&mut body, section, part, i, Some(&sect_pr));
        }
    }
    if doc.sections.is_empty() {
        body.push_str("<w:p/>");
        body.push_str(&section_properties(PageSize::default()));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{NS_W}" xmlns:r="{NS_R}" xmlns:wp="{NS_WP}" xmlns:a="{NS_A}" xmlns:pic="{NS_PIC}">
<w:body>{body}</w:body>
</w:document>"#
    )
}

/// Write one section's paragraphs. `sect_pr` closes a non-final section and
/// goes into the last paragraph's properties.
fn write_section(
    out: &mut String,
    section: &Section,
    part: &MediaPart,
    index: usize,
    sect_pr: Option<&str>,
) {
    let background_closes = section.paragraphs.is_empty();
    write_background(
        out,
        section,
        part,
        index,
        if background_closes { sect_pr } else { None },
    );

    let count = section.paragraphs.len();
    for (n, para) in section.paragraphs.iter().enumerate() {
        let closing = if n + 1 == count { sect_pr } else { None };
        write_paragraph(out, para, closing);
    }
}

fn write_background(
    out: &mut String,
    section: &Section,
    part: &MediaPart,
    index: usize,
    sect_pr: Option<&str>,
) {
    let cx = px_to_emu(section.background.width as f64);
    let cy = px_to_emu(section.background.height as f64);
    let id = index + 1;

    // A one-point exact line keeps the anchor paragraph from pushing text down.
    out.push_str(r#"<w:p><w:pPr><w:spacing w:before="0" w:after="0" w:line="20" w:lineRule="exact"/>"#);
    if let Some(sect) = sect_pr {
        out.push_str(sect);
    }
    out.push_str("</w:pPr>");
    let _ = write!(
        out,
        concat!(
            r#"<w:r><w:drawing><wp:anchor distT="0" distB="0" distL="0" distR="0" simplePos="0" relativeHeight="{id}" behindDoc="1" locked="1" layoutInCell="1" allowOverlap="1">"#,
            r#"<wp:simplePos x="0" y="0"/>"#,
            r#"<wp:positionH relativeFrom="page"><wp:posOffset>0</wp:posOffset></wp:positionH>"#,
            r#"<wp:positionV relativeFrom="page"><wp:posOffset>0</wp:posOffset></wp:positionV>"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:wrapNone/>"#,
            r#"<wp:docPr id="{id}" name="Page {id} background"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="{pic}"><pic:pic>"#,
            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="page{id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:anchor></w:drawing></w:r></w:p>"#
        ),
        id = id,
        cx = cx,
        cy = cy,
        pic = NS_PIC,
        rid = part.rid,
    );
}

fn write_paragraph(out: &mut String, para: &Paragraph, sect_pr: Option<&str>) {
    let style = &para.style;
    let _ = write!(
        out,
        r#"<w:p><w:pPr><w:spacing w:before="{}" w:after="0"/><w:ind w:left="{}"/><w:jc w:val="{}"/>"#,
        style.space_before,
        style.indent_left,
        justification(style.alignment)
    );
    if let Some(sect) = sect_pr {
        out.push_str(sect);
    }
    out.push_str("</w:pPr>");

    let run = &para.run;
    let font = xml_text(&run.style.font_name);
    let _ = write!(
        out,
        r#"<w:r><w:rPr><w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}" w:eastAsia="{0}"/>"#,
        font
    );
    if run.style.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if run.style.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    let _ = write!(
        out,
        r#"<w:color w:val="{0}"/><w:sz w:val="{1}"/><w:szCs w:val="{1}"/></w:rPr><w:t xml:space="preserve">{2}</w:t></w:r></w:p>"#,
        run.style.color.to_hex(),
        run.style.size,
        xml_text(&run.text)
    );
}

/// Escape text for XML, dropping characters XML 1.0 cannot carry.
///
/// Vertical tab and form feed become spaces; other control characters are removed.
fn xml_text(raw: &str) -> Cow<'_, str> {
    if raw.chars().all(is_xml_char) {
        return escape(raw);
    }
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            '\u{B}' | '\u{C}' => Some(' '),
            c if is_xml_char(c) => Some(c),
            _ => None,
        })
        .collect();
    Cow::Owned(escape(cleaned.as_str()).into_owned())
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

fn justification(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

fn section_properties(size: PageSize) -> String {
    let orient = if size.is_landscape() {
        r#" w:orient="landscape""#
    } else {
        ""
    };
    format!(
        r#"<w:sectPr><w:type w:val="nextPage"/><w:pgSz w:w="{}" w:h="{}"{}/><w:pgMar w:top="0" w:right="0" w:bottom="0" w:left="0" w:header="0" w:footer="0" w:gutter="0"/></w:sectPr>"#,
        px_to_twip(size.width as f64),
        px_to_twip(size.height as f64),
        orient
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BackgroundImage, Metadata, ParagraphStyle, Resource, RgbColor, TextRun, TextStyle,
    };
    use std::io::Read;

    fn section(size: PageSize, texts: &[&str]) -> Section {
        let bg = BackgroundImage::full_page(Resource::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]), size);
        let mut s = Section::new(size, bg);
        for t in texts {
            s.add_paragraph(Paragraph::new(TextRun::new(*t)));
        }
        s
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_package_parts() {
        let mut doc = Document::with_metadata(Metadata::now().with_title("R&D"));
        doc.add_section(section(PageSize::A4_PORTRAIT, &["Hello"]));
        let bytes = to_docx(&doc).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/settings.xml",
            "word/_rels/document.xml.rels",
            "word/media/page1.jpeg",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>R&amp;D</dc:title>"));
        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"Extension="jpeg" ContentType="image/jpeg""#));
    }

    #[test]
    fn test_page_geometry_and_margins() {
        let mut doc = Document::new();
        doc.add_section(section(PageSize::A4_PORTRAIT.swapped(), &["x"]));
        let xml = read_part(&to_docx(&doc).unwrap(), "word/document.xml");
        assert!(xml.contains(r#"<w:pgSz w:w="16845" w:h="11910" w:orient="landscape"/>"#));
        assert!(xml.contains(r#"w:top="0" w:right="0" w:bottom="0" w:left="0""#));
        assert!(xml.contains(r#"behindDoc="1""#));
        assert!(xml.contains(r#"<wp:extent cx="10696575" cy="7562850"/>"#));
    }

    #[test]
    fn test_background_precedes_text() {
        let mut doc = Document::new();
        doc.add_section(section(PageSize::SLIDE, &["Title"]));
        let xml = read_part(&to_docx(&doc).unwrap(), "word/document.xml");
        let anchor = xml.find("<wp:anchor").unwrap();
        let text = xml.find("Title").unwrap();
        assert!(anchor < text);
    }

    #[test]
    fn test_section_breaks() {
        let mut doc = Document::new();
        doc.add_section(section(PageSize::SLIDE, &["one"]));
        doc.add_section(section(PageSize::SLIDE, &[]));
        doc.add_section(section(PageSize::SLIDE, &["three"]));
        let bytes = to_docx(&doc).unwrap();
        let xml = read_part(&bytes, "word/document.xml");

        assert_eq!(xml.matches("<w:sectPr>").count(), 3);
        // the final section's properties are a direct child of the body
        assert!(xml.ends_with("</w:sectPr></w:body>\n</w:document>"));

        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/page3.jpeg""#));
    }

    #[test]
    fn test_run_properties() {
        let style = TextStyle {
            bold: true,
            italic: true,
            font_name: "Arial".into(),
            size: 36,
            color: RgbColor(255, 0, 0),
        };
        let para = Paragraph::new(TextRun::new("a < b").with_style(style)).with_style(
            ParagraphStyle {
                alignment: Alignment::Justify,
                indent_left: -30,
                space_before: 300,
            },
        );
        let mut out = String::new();
        write_paragraph(&mut out, &para, None);

        assert!(out.contains(r#"<w:spacing w:before="300" w:after="0"/>"#));
        assert!(out.contains(r#"<w:ind w:left="-30"/>"#));
        assert!(out.contains(r#"<w:jc w:val="both"/>"#));
        assert!(out.contains("<w:b/>"));
        assert!(out.contains("<w:i/>"));
        assert!(out.contains(r#"<w:color w:val="ff0000"/>"#));
        assert!(out.contains(r#"<w:sz w:val="36"/>"#));
        assert!(out.contains("a &lt; b"));
    }

    #[test]
    fn test_control_characters_removed() {
        let mut doc = Document::with_metadata(Metadata::now().with_title("Q3\u{0}\u{1B} review"));
        doc.add_section(section(
            PageSize::A4_PORTRAIT,
            &["Page\u{000C}break and \u{000B}vtab", "bell\u{7}\u{FFFE} tab\tkept"],
        ));
        let bytes = to_docx(&doc).unwrap();

        for part in ["word/document.xml", "docProps/core.xml"] {
            let xml = read_part(&bytes, part);
            assert!(xml.chars().all(is_xml_char), "{} has non-XML characters", part);
        }
        let xml = read_part(&bytes, "word/document.xml");
        assert!(xml.contains(">Page break and  vtab<"));
        assert!(xml.contains(">bell tab\tkept<"));
        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Q3 review</dc:title>"));
    }

    #[test]
    fn test_xml_text_borrows_clean_input() {
        assert!(matches!(xml_text("plain"), Cow::Borrowed("plain")));
        assert_eq!(xml_text("a\u{C}<b"), "a &lt;b");
    }

    #[test]
    fn test_empty_document_is_valid() {
        let xml = read_part(&to_docx(&Document::new()).unwrap(), "word/document.xml");
        assert!(xml.contains("<w:p/>"));
        assert!(xml.contains(r#"<w:pgSz w:w="11910" w:h="16845"/>"#));
    }
}
