//! Nutrilabel renders nutrition-facts labels as small single-page PDF documents.
//!
//! A label is built from sixteen values (the serving size, the calories and fourteen nutrient
//! amounts) in two steps. First the content is computed: the seventeen table rows with their
//! percent of daily value, the static header and footnote, and the style directives of the
//! table. Then the content is laid out on a 76 by 132 millimeters page and written into a PDF
//! document which embeds the two fonts the label is set in.
//!
//! The entry point is `create_nutrition_facts`, which performs both steps and writes the
//! document to the output path of a `LabelConfiguration`.

/// This module contains the `ContextError` type, which is the error type of the low-level
/// operations of this crate, and `LabelError`, the error reported to the callers.
///
/// `LabelError` separates the errors found while building the content of a label (an unknown
/// nutrient, an incomplete label text, a malformed amount) from the ones raised while
/// rendering it (missing fonts, an unwritable output). Content errors are always reported
/// before the renderer is involved.
pub mod error;

/// The nutrients, their amounts and the input of a label.
///
/// Amounts are parsed when the input is constructed. Empty values are absent and whitespace
/// counts as zero. Anything else has to be a non-negative decimal number no larger than
/// `MAXIMUM_AMOUNT`. The original text of an amount is kept, since it is the one printed on
/// the label.
pub mod nutrient;

/// The reference daily values and the percentage computation.
pub mod daily_value;

/// The static text of a label, loaded from a JSON resource.
pub mod locale;

/// The rows of the nutrition table and the content of a label.
pub mod label;

/// The style directives of the nutrition table and their resolution into cell styles.
///
/// The look of every row is derived from its kind and from its neighbours (the first
/// micronutrient opens a new block, the last row closes the table), and only then turned
/// into directives addressing cells by index, in the same form as the directives of a
/// spreadsheet-like table.
pub mod style;

/// The positioning of the label content on its page.
pub mod layout;

/// The module were the `PdfDocument` interface for working with PDF documents is presented.
///
/// # Introduction
///
/// The main component of this module is the struct `PdfDocument`. It offers convenience functions
/// such as `add_page`, `add_font`, `write_text_to_page`, `draw_line_to_page`, `write_all` and
/// `save_to_bytes`, which allow the label renderer to interact with a PDF document in a meaningful
/// way, while keeping the low-level `lopdf` objects hidden below a curtain of private methods.
///
/// Fonts are embedded as CID-keyed TrueType fonts, together with the widths of the glyphs used
/// in the document and a character map that keeps the text searchable.
pub mod pdf;

/// The label renderer: fonts, document construction and the atomic saving of the output.
pub mod render;

/// The configuration of a label rendering.
pub mod configuration;

pub use configuration::{FontResources, LabelConfiguration};
pub use daily_value::{compute_percent, DailyValueTable, DAILY_VALUES};
pub use error::{ContextError, LabelError};
pub use label::{build_label_content, build_rows, LabelContent, LabelRow, RowKind};
pub use locale::LabelText;
pub use nutrient::{NutrientAmount, NutrientInput, NutrientKey, MAXIMUM_AMOUNT};
pub use render::{build_document, create_nutrition_facts, LoadedFonts};
pub use style::{build_style_directives, StyleDirective};
