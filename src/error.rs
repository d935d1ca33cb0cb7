use serde::{Deserialize, Serialize};

use crate::nutrient::NutrientKey;

/// A struct that represents an error with a context and possibly the propagated source error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContextError {
    pub context: String,
    pub source_error: Option<String>,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{}", self.context),
        }
    }
}

impl std::error::Error for ContextError {}

impl ContextError {
    /// Create a new `ContextError` with the given context.
    pub fn with_context<S: Into<String>>(context: S) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new `ContextError` with the given context and source error.
    pub fn with_error<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ContextError {
        ContextError {
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }
}

/// The failures a label can run into, split by where they originate.
///
/// Content errors (`Configuration` and `InputFormat`) are always detected before
/// anything is handed to the renderer, so a failed call never leaves a partially
/// written document behind. `Render` errors come from the document boundary: fonts,
/// PDF assembly and the output file.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelError {
    /// A nutrient key or a resource required to build the label is missing or unreadable.
    Configuration(ContextError),
    /// A nutrient amount was supplied but is not a finite, non-negative decimal number.
    InputFormat { field: NutrientKey, value: String },
    /// The document could not be produced or written.
    Render(ContextError),
}

impl std::fmt::Display for LabelError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelError::Configuration(error) => {
                write!(formatter, "Invalid label configuration: {}", error)
            }
            LabelError::InputFormat { field, value } => write!(
                formatter,
                "Invalid amount {:?} for the nutrient {:?}, expected a non-negative decimal number",
                value,
                field.name()
            ),
            LabelError::Render(error) => write!(formatter, "Unable to render the label: {}", error),
        }
    }
}

impl std::error::Error for LabelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LabelError::Configuration(error) | LabelError::Render(error) => Some(error),
            LabelError::InputFormat { .. } => None,
        }
    }
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_is_lowercased_after_the_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file");
        let error = ContextError::with_error("Failed to read the font", &io_error);

        assert_eq!(error.to_string(), "Failed to read the font: no such file");
    }

    #[test]
    fn context_only_error_displays_the_context() {
        let error = ContextError::with_context("Missing page");

        assert_eq!(error.to_string(), "Missing page");
        assert_eq!(error.source_error, None);
    }

    #[test]
    fn input_format_error_names_the_field_and_value() {
        let error = LabelError::InputFormat {
            field: NutrientKey::Iron,
            value: "1,2".into(),
        };

        assert_eq!(
            error.to_string(),
            "Invalid amount \"1,2\" for the nutrient \"iron\", expected a non-negative decimal number"
        );
    }
}
