use lopdf::{content::Operation, Object, StringFormat};
use owned_ttf_parser::{AsFaceRef as _, Face, GlyphId, OwnedFace};
use std::{
    collections::BTreeMap,
    io::BufWriter,
    mem,
    path::Path,
    sync::Arc,
};
use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::ContextError;
use crate::layout::millimeters_to_points;

/// The (insofar) relevant vertical metrics of a font, scaled to a 1000 units em square.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: i64,
    pub descent: i64,
    pub cap_height: i64,
    pub bounding_box: [i64; 4],
}

/// A TrueType font loaded from a file, shared cheaply between documents.
///
/// The raw bytes are kept next to the parsed face because the whole font program is
/// embedded into every document that uses it.
#[derive(Clone)]
pub struct Font {
    bytes: Arc<Vec<u8>>,
    face: Arc<OwnedFace>,
    units_per_em: u16,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Font")
            .field("bytes", &self.bytes.len())
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl Font {
    /// Constructs a font from the underlying raw data extracted from the TTF font file.
    pub fn from_bytes(data: Vec<u8>) -> Result<Font, ContextError> {
        let face = OwnedFace::from_vec(data.clone(), 0)
            .map_err(|error| ContextError::with_error("Failed to parse font", &error))?;
        let units_per_em = face.as_face_ref().units_per_em();

        Ok(Font {
            bytes: Arc::new(data),
            face: Arc::new(face),
            units_per_em,
        })
    }

    /// Loads a TTF font, or either way an OTF font which is just a wrapper around a TTF font.
    pub fn from_path(font_path: &Path) -> Result<Font, ContextError> {
        let font_bytes = std::fs::read(font_path).map_err(|error| {
            ContextError::with_error(
                format!("Failed to read font {:?}, probably the path is wrong", font_path),
                &error,
            )
        })?;

        Font::from_bytes(font_bytes)
            .map_err(|error| ContextError::with_error(format!("Failed to load font {:?}", font_path), &error))
    }

    fn face(&self) -> &Face<'_> {
        self.face.as_face_ref()
    }

    fn scale(&self, font_units: f32) -> f32 {
        font_units * 1000.0 / self.units_per_em as f32
    }

    pub fn metrics(&self) -> FontMetrics {
        let face = self.face();
        let bounding_box = face.global_bounding_box();
        let ascent = self.scale(face.ascender() as f32) as i64;

        FontMetrics {
            ascent,
            descent: self.scale(face.descender() as f32) as i64,
            cap_height: face
                .capital_height()
                .map(|height| self.scale(height as f32) as i64)
                .unwrap_or(ascent),
            bounding_box: [
                self.scale(bounding_box.x_min as f32) as i64,
                self.scale(bounding_box.y_min as f32) as i64,
                self.scale(bounding_box.x_max as f32) as i64,
                self.scale(bounding_box.y_max as f32) as i64,
            ],
        }
    }

    /// Retrieve the glyph ID of a specific codepoint, which in our case is just a `char`.
    pub fn glyph_id(&self, codepoint: char) -> Option<u16> {
        self.face().glyph_index(codepoint).map(|glyph_id| glyph_id.0)
    }

    /// The horizontal advance of a glyph in thousandths of the font size.
    pub fn glyph_width(&self, glyph_id: u16) -> Option<f32> {
        self.face()
            .glyph_hor_advance(GlyphId(glyph_id))
            .map(|advance| self.scale(advance as f32))
    }

    /// The advance width of a text set at the given size, in points. Characters missing
    /// from the font do not contribute.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let thousandths: f32 = text
            .nfc()
            .filter_map(|character| self.glyph_id(character))
            .filter_map(|glyph_id| self.glyph_width(glyph_id))
            .sum();

        thousandths * font_size / 1000.0
    }
}

/// A font registered in a document together with the glyphs written with it so far.
#[derive(Debug, Clone)]
struct DocumentFont {
    object_id: lopdf::ObjectId,
    font: Font,
    resource_name: String,
    used_glyphs: BTreeMap<u16, char>,
}

impl DocumentFont {
    /// Inserts the font program, its descriptor and its character maps into the document,
    /// returning the `Type0` font dictionary which refers to them.
    fn insert_into_document(&self, inner_document: &mut lopdf::Document) -> lopdf::Dictionary {
        use lopdf::Object::*;
        let metrics = self.font.metrics();

        let font_stream = lopdf::Stream::new(
            lopdf::Dictionary::from_iter(vec![("Length1", Integer(self.font.bytes.len() as i64))]),
            self.font.bytes.as_ref().clone(),
        );
        let font_stream_id = inner_document.add_object(font_stream);

        let font_descriptor = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("FontDescriptor".into())),
            ("FontName", Name(self.resource_name.clone().into_bytes())),
            ("Ascent", Integer(metrics.ascent)),
            ("Descent", Integer(metrics.descent)),
            ("CapHeight", Integer(metrics.cap_height)),
            ("ItalicAngle", Integer(0)),
            // Nonsymbolic: the font uses a standard character set
            ("Flags", Integer(32)),
            // There is no reliable way to extract the stem width from the font data, 80 is the usual approximation
            ("StemV", Integer(80)),
            (
                "FontBBox",
                Array(metrics.bounding_box.iter().map(|value| Integer(*value)).collect()),
            ),
            ("FontFile2", Reference(font_stream_id)),
        ]);
        let font_descriptor_id = inner_document.add_object(font_descriptor);

        let descendant_font = lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Font".into())),
            ("Subtype", Name("CIDFontType2".into())),
            ("BaseFont", Name(self.resource_name.clone().into_bytes())),
            (
                "CIDSystemInfo",
                Dictionary(lopdf::Dictionary::from_iter(vec![
                    ("Registry", String("Adobe".into(), StringFormat::Literal)),
                    ("Ordering", String("Identity".into(), StringFormat::Literal)),
                    ("Supplement", Integer(0)),
                ])),
            ),
            ("W", Array(self.glyph_widths())),
            ("DW", Integer(1000)),
            ("FontDescriptor", Reference(font_descriptor_id)),
        ]);

        let to_unicode_map = generate_cid_to_unicode_map(&self.used_glyphs);
        let to_unicode_id = inner_document.add_object(lopdf::Stream::new(
            lopdf::Dictionary::new(),
            to_unicode_map.into_bytes(),
        ));

        lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Font".into())),
            ("Subtype", Name("Type0".into())),
            ("BaseFont", Name(self.resource_name.clone().into_bytes())),
            // `Identity-H` is used for horizontal writing, the glyph IDs are written as they are
            ("Encoding", Name("Identity-H".into())),
            ("DescendantFonts", Array(vec![Dictionary(descendant_font)])),
            ("ToUnicode", Reference(to_unicode_id)),
        ])
    }

    fn glyph_widths(&self) -> Vec<Object> {
        let widths = self.used_glyphs.keys().map(|glyph_id| {
            let width = self.font.glyph_width(*glyph_id);
            if width.is_none() {
                log::warn!(
                    "Glyph ID {} of the font {:?} has no width, the default width is used",
                    glyph_id,
                    self.resource_name
                );
            }
            (*glyph_id, width)
        });

        encode_glyph_widths(widths)
    }
}

/// Encodes glyph widths the way the `W` array of a CID font expects them: runs of consecutive
/// glyph IDs are written as `first [width width ...]`. The glyph IDs must be ascending, the
/// ones without a width are left out and fall back to the default width of the font.
fn encode_glyph_widths<I>(widths: I) -> Vec<Object>
where
    I: IntoIterator<Item = (u16, Option<f32>)>,
{
    let mut width_objects = Vec::<Object>::new();
    let mut run_start: Option<u16> = None;
    let mut previous_glyph_id = 0u16;
    let mut run_widths = Vec::<Object>::new();

    for (glyph_id, width) in widths {
        let Some(width) = width else {
            continue;
        };

        match run_start {
            Some(_) if previous_glyph_id.checked_add(1) == Some(glyph_id) => {}
            Some(start) => {
                width_objects.push(Object::Integer(start as i64));
                width_objects.push(Object::Array(mem::take(&mut run_widths)));
                run_start = Some(glyph_id);
            }
            None => run_start = Some(glyph_id),
        }
        run_widths.push(Object::Integer(width as i64));
        previous_glyph_id = glyph_id;
    }

    if let Some(start) = run_start {
        width_objects.push(Object::Integer(start as i64));
        width_objects.push(Object::Array(run_widths));
    }

    width_objects
}

/// A single page of the document, with the content stream operations drawn on it.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    operations: Vec<Operation>,
}

/// This struct represents the actual PDF document on a high-level. It is an interface to the actual underlying
/// `lopdf::Document` with the addition of the PDF pages, the document ID and the fonts used in the document.
pub struct PdfDocument {
    fonts: Vec<DocumentFont>,
    /// The underlying PDF document: this is a low-level interface and shouldn't be directly interacted with
    /// unless strictly necessary.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used to in order to set the PDF `ID` tag.
    pub identifier: String,
    /// The title stored in the document information dictionary.
    pub title: String,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to version 1.5
    /// of the PDF specification.
    pub fn new<S: Into<String>, T: Into<String>>(identifier: S, title: T) -> Self {
        PdfDocument {
            fonts: Vec::new(),
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: identifier.into(),
            title: title.into(),
            pages: Vec::new(),
        }
    }

    /// Adds a page of given width and height in millimeters, returning its index.
    pub fn add_page(&mut self, page_width: f32, page_height: f32) -> usize {
        self.pages.push(PdfPage {
            width: millimeters_to_points(page_width),
            height: millimeters_to_points(page_height),
            operations: Vec::new(),
        });

        self.pages.len() - 1
    }

    pub fn page(&self, page_index: usize) -> Option<&PdfPage> {
        self.pages.get(page_index)
    }

    /// Registers a font with the document and returns the index to write text with.
    /// The font program is embedded when the document is finalized.
    pub fn add_font(&mut self, font: &Font) -> usize {
        let object_id = self.inner_document.new_object_id();
        let resource_name = format!("F{}", self.fonts.len());
        self.fonts.push(DocumentFont {
            object_id,
            font: font.clone(),
            resource_name,
            used_glyphs: BTreeMap::new(),
        });

        self.fonts.len() - 1
    }

    /// Writes the text in the specified font and color, with its baseline starting at the given
    /// position in points from the bottom-left corner of the page.
    pub fn write_text_to_page(
        &mut self,
        page_index: usize,
        color: [f32; 3],
        text: &str,
        font_index: usize,
        font_size: f32,
        position: [f32; 2],
    ) -> Result<(), ContextError> {
        let document_font = self.fonts.get_mut(font_index).ok_or(ContextError::with_context(
            format!("Failed to find font {} into the fonts of the document", font_index),
        ))?;

        let mut glyph_id_bytes = Vec::<u8>::new();
        // Normalize the text in the NFC form before processing
        for character in text.nfc() {
            if let Some(glyph_id) = document_font.font.glyph_id(character) {
                document_font.used_glyphs.entry(glyph_id).or_insert(character);
                glyph_id_bytes.extend_from_slice(&glyph_id.to_be_bytes());
            } else {
                log::warn!(
                    "Unable to find the character {:?} in the font {:?}",
                    character,
                    document_font.resource_name
                )
            }
        }
        let resource_name = document_font.resource_name.clone();

        let [x, y] = position;
        let [red, green, blue] = color;
        self.add_operations_to_page(
            page_index,
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(resource_name.into_bytes()), font_size.into()]),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("rg", vec![red.into(), green.into(), blue.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(glyph_id_bytes, StringFormat::Hexadecimal)],
                ),
                Operation::new("ET", vec![]),
            ],
        )
    }

    /// Strokes a straight line between two points, both in points from the bottom-left corner of the page.
    pub fn draw_line_to_page(
        &mut self,
        page_index: usize,
        start: [f32; 2],
        end: [f32; 2],
        line_width: f32,
        color: [f32; 3],
    ) -> Result<(), ContextError> {
        let [red, green, blue] = color;
        self.add_operations_to_page(
            page_index,
            vec![
                // Isolate the line width and the stroke color from the rest of the page
                Operation::new("q", vec![]),
                Operation::new("w", vec![line_width.into()]),
                Operation::new("RG", vec![red.into(), green.into(), blue.into()]),
                Operation::new("m", vec![start[0].into(), start[1].into()]),
                Operation::new("l", vec![end[0].into(), end[1].into()]),
                Operation::new("S", vec![]),
                Operation::new("Q", vec![]),
            ],
        )
    }

    /// Write the pages and fonts so far specified into the underlying document and finalize it.
    ///
    /// The creation date is pinned to the Unix epoch and the identifiers are given by the caller,
    /// so that the same content always produces the same bytes.
    pub fn write_all(&mut self, instance_id: &str) -> Result<(), ContextError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        if self.pages.is_empty() {
            return Err(ContextError::with_context(
                "Unable to finalize a document without pages",
            ));
        }

        let timestamp = to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH);
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            ("CreationDate", String(timestamp.clone().into_bytes(), Literal)),
            ("ModDate", String(timestamp.into_bytes(), Literal)),
            ("Title", String(encode_text_string(&self.title), Hexadecimal)),
            ("Creator", String("nutrilabel".into(), Literal)),
            ("Producer", String("nutrilabel".into(), Literal)),
            ("Identifier", String(self.identifier.clone().into_bytes(), Literal)),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        // Embed the fonts and collect them into the resource dictionary shared by every page
        let mut fonts_dictionary = lopdf::Dictionary::new();
        for document_font in self.fonts.iter() {
            let font_dictionary = document_font.insert_into_document(&mut self.inner_document);
            self.inner_document
                .objects
                .insert(document_font.object_id, Dictionary(font_dictionary));
            fonts_dictionary.set(
                document_font.resource_name.clone(),
                Reference(document_font.object_id),
            );
        }
        let resources_id = self.inner_document.add_object(lopdf::Dictionary::from_iter(vec![(
            "Font",
            Dictionary(fonts_dictionary),
        )]));

        let pages_id = self.inner_document.new_object_id();
        let mut page_ids = Vec::<Object>::new();
        for page in self.pages.iter() {
            let content = lopdf::content::Content {
                operations: page.operations.clone(),
            };
            let content_bytes = content.encode().map_err(|error| {
                ContextError::with_error("Failed to encode the page content", &error)
            })?;
            let content_id = self
                .inner_document
                .add_object(lopdf::Stream::new(lopdf::Dictionary::new(), content_bytes));

            let page_box: Vec<Object> =
                vec![Integer(0), Integer(0), page.width.into(), page.height.into()];
            let page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Rotate", Integer(0)),
                ("MediaBox", page_box.clone().into()),
                ("TrimBox", page_box.clone().into()),
                ("CropBox", page_box.into()),
                ("Parent", Reference(pages_id)),
                ("Resources", Reference(resources_id)),
                ("Contents", Reference(content_id)),
            ]);
            page_ids.push(Reference(self.inner_document.add_object(page_dictionary)));
        }

        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(page_ids.len() as i64)),
            ("Kids", Array(page_ids)),
        ]);
        self.inner_document.objects.insert(pages_id, Dictionary(pages));

        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document.trailer.set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.as_bytes().to_vec(), Literal),
            ]),
        );

        Ok(())
    }

    /// Optimize the PDF document (only superficially).
    pub fn optimize(&mut self) {
        self.inner_document.prune_objects();
        self.inner_document.delete_zero_length_streams();
        self.inner_document.renumber_objects();
        self.inner_document.compress();
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, ContextError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            ContextError::with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    fn add_operations_to_page(
        &mut self,
        page_index: usize,
        operations: Vec<Operation>,
    ) -> Result<(), ContextError> {
        let pdf_page = self
            .pages
            .get_mut(page_index)
            .ok_or(ContextError::with_context(format!(
                "Failed to find the page with index {}",
                page_index
            )))?;
        pdf_page.operations.extend(operations);

        Ok(())
    }
}

const CMAP_HEADER: &str = "/CIDInit /ProcSet findresource begin\n\
12 dict begin\n\
begincmap\n\
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
/CMapName /Adobe-Identity-UCS def\n\
/CMapType 2 def\n\
1 begincodespacerange\n\
<0000> <FFFF>\n\
endcodespacerange\n";

const CMAP_FOOTER: &str = "endcmap\n\
CMapName currentdict /CMap defineresource pop\n\
end\n\
end\n";

/// Generates the CMap which maps the glyph IDs back to Unicode, so that the text of the
/// document can be searched and copied. A `bfchar` block holds at most 100 entries and
/// never crosses a boundary of the first byte of the glyph ID.
fn generate_cid_to_unicode_map(used_glyphs: &BTreeMap<u16, char>) -> String {
    let mut blocks: Vec<Vec<(u16, char)>> = Vec::new();
    for (glyph_id, character) in used_glyphs.iter() {
        match blocks.last_mut() {
            Some(block)
                if block.len() < 100
                    && block.first().map(|(first, _)| first >> 8) == Some(glyph_id >> 8) =>
            {
                block.push((*glyph_id, *character))
            }
            _ => blocks.push(vec![(*glyph_id, *character)]),
        }
    }

    let mut cid_to_unicode_map = CMAP_HEADER.to_string();
    for block in blocks {
        cid_to_unicode_map.push_str(&format!("{} beginbfchar\n", block.len()));
        for (glyph_id, character) in block {
            let mut utf16 = [0u16; 2];
            let code_units: String = character
                .encode_utf16(&mut utf16)
                .iter()
                .map(|unit| format!("{unit:04x}"))
                .collect();
            cid_to_unicode_map.push_str(&format!("<{glyph_id:04x}> <{code_units}>\n"));
        }
        cid_to_unicode_map.push_str("endbfchar\n");
    }
    cid_to_unicode_map.push_str(CMAP_FOOTER);

    cid_to_unicode_map
}

/// Encodes a string for the document information dictionary: ASCII text is kept as it is,
/// anything else is written as UTF-16BE preceded by its byte order mark.
fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }

    let mut bytes = vec![0xFE, 0xFF];
    for code_unit in text.encode_utf16() {
        bytes.extend_from_slice(&code_unit.to_be_bytes());
    }
    bytes
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}
