use std::{
    collections::HashMap,
    ffi::OsString,
    io::Write as _,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, OnceLock},
};

use crate::configuration::{FontResources, LabelConfiguration};
use crate::error::{ContextError, LabelError};
use crate::label::{build_label_content, LabelContent};
use crate::layout::{layout_label, TextMeasure, PAGE_HEIGHT, PAGE_WIDTH};
use crate::nutrient::NutrientInput;
use crate::pdf::{Font, PdfDocument};
use crate::style::{Color, FontWeight};

/// The regular and bold faces a label is set in, parsed and ready to be embedded.
#[derive(Debug, Clone)]
pub struct LoadedFonts {
    regular: Font,
    bold: Font,
}

/// The fonts loaded so far by this process, keyed by the files they came from.
static FONT_REGISTRY: OnceLock<Mutex<HashMap<FontResources, LoadedFonts>>> = OnceLock::new();

fn font_registry() -> Result<MutexGuard<'static, HashMap<FontResources, LoadedFonts>>, LabelError> {
    FONT_REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|_| {
            LabelError::Render(ContextError::with_context(
                "The font registry was poisoned by a panicking thread",
            ))
        })
}

impl LoadedFonts {
    pub fn new(regular: Font, bold: Font) -> LoadedFonts {
        LoadedFonts { regular, bold }
    }

    /// Reads and parses both font files.
    pub fn load(resources: &FontResources) -> Result<LoadedFonts, LabelError> {
        let regular = Font::from_path(&resources.regular).map_err(LabelError::Render)?;
        let bold = Font::from_path(&resources.bold).map_err(LabelError::Render)?;
        log::debug!("Loaded the label fonts {:?}", resources);

        Ok(LoadedFonts { regular, bold })
    }

    /// Returns the fonts of the given files, loading them only the first time they are asked
    /// for in this process. Later calls share the already parsed faces.
    ///
    /// The registry is not locked while the files are read. When two threads load the same
    /// fonts at once, the first one to finish is kept.
    pub fn shared(resources: &FontResources) -> Result<LoadedFonts, LabelError> {
        if let Some(fonts) = font_registry()?.get(resources) {
            return Ok(fonts.clone());
        }

        let fonts = LoadedFonts::load(resources)?;
        let shared_fonts = font_registry()?
            .entry(resources.clone())
            .or_insert(fonts)
            .clone();

        Ok(shared_fonts)
    }

    pub fn font(&self, weight: FontWeight) -> &Font {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl TextMeasure for LoadedFonts {
    fn text_width(&self, text: &str, weight: FontWeight, font_size: f32) -> f32 {
        self.font(weight).text_width(text, font_size)
    }
}

/// Lays out the label content on its page and writes it into a finalized PDF document.
pub fn build_document(
    content: &LabelContent,
    fonts: &LoadedFonts,
    configuration: &LabelConfiguration,
) -> Result<PdfDocument, LabelError> {
    let layout = layout_label(content, fonts);

    let mut document = PdfDocument::new(configuration.document_identifier.clone(), content.header.clone());
    let page_index = document.add_page(PAGE_WIDTH, PAGE_HEIGHT);
    let regular_font_index = document.add_font(&fonts.regular);
    let bold_font_index = document.add_font(&fonts.bold);

    for placed_text in layout.texts.iter() {
        let font_index = match placed_text.weight {
            FontWeight::Regular => regular_font_index,
            FontWeight::Bold => bold_font_index,
        };
        document
            .write_text_to_page(
                page_index,
                Color::BLACK.components(),
                &placed_text.text,
                font_index,
                placed_text.font_size,
                placed_text.position,
            )
            .map_err(LabelError::Render)?;
    }

    for placed_rule in layout.rules.iter() {
        document
            .draw_line_to_page(
                page_index,
                placed_rule.start,
                placed_rule.end,
                placed_rule.rule.width,
                placed_rule.rule.color.components(),
            )
            .map_err(LabelError::Render)?;
    }

    document
        .write_all(&configuration.instance_identifier)
        .map_err(LabelError::Render)?;
    if configuration.compress {
        document.optimize();
    }

    Ok(document)
}

/// The path the document is written to before being moved onto the output path.
fn swap_path(output_path: &Path) -> PathBuf {
    let mut swap_path = OsString::from(output_path.as_os_str());
    swap_path.push(".swp");
    PathBuf::from(swap_path)
}

/// Saves the document so that the output path either keeps its previous content or holds
/// the complete new document: the bytes are written to an intermediate `.swp` file which
/// is then renamed onto the output path.
pub fn save_document(document: &mut PdfDocument, output_path: &Path) -> Result<(), LabelError> {
    let pdf_document_bytes = document.save_to_bytes().map_err(LabelError::Render)?;
    let swap_path = swap_path(output_path);

    let write_result = write_and_rename(&pdf_document_bytes, &swap_path, output_path);
    if write_result.is_err() && swap_path.exists() {
        if let Err(error) = std::fs::remove_file(&swap_path) {
            log::warn!("Unable to remove the intermediate file {:?}: {}", swap_path, error);
        }
    }

    write_result.map_err(LabelError::Render)
}

fn write_and_rename(bytes: &[u8], swap_path: &Path, output_path: &Path) -> Result<(), ContextError> {
    let mut swap_file = std::fs::File::create(swap_path).map_err(|error| {
        ContextError::with_error(format!("Failed to create the output file {:?}", swap_path), &error)
    })?;
    swap_file
        .write_all(bytes)
        .and_then(|_| swap_file.sync_all())
        .map_err(|error| {
            ContextError::with_error(format!("Failed to write the output file {:?}", swap_path), &error)
        })?;
    std::fs::rename(swap_path, output_path).map_err(|error| {
        ContextError::with_error(
            format!("Unable to move the output file to {:?}", output_path),
            &error,
        )
    })
}

/// Renders the nutrition-facts label of the input and writes it to the output path of the
/// configuration, returning that path.
///
/// The label text is resolved before any font is loaded, so configuration problems never
/// leave an output file behind.
pub fn create_nutrition_facts(
    input: &NutrientInput,
    configuration: &LabelConfiguration,
) -> Result<PathBuf, LabelError> {
    configuration.validate()?;
    let text = configuration.label_text()?;
    let content = build_label_content(input, &text);

    let fonts = LoadedFonts::shared(&configuration.fonts)?;
    let mut document = build_document(&content, &fonts, configuration)?;
    save_document(&mut document, &configuration.output_path)?;
    log::info!(
        "Saved the nutrition label to the path: {:?}",
        configuration.output_path
    );

    Ok(configuration.output_path.clone())
}
