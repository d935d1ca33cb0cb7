use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContextError, LabelError};
use crate::locale::LabelText;

/// The two font faces a label is set in. Both need to cover the Cyrillic alphabet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FontResources {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

/// The settings of a label rendering, usually read from a JSON file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfiguration {
    pub fonts: FontResources,
    /// The label text to use instead of the built-in Russian one.
    #[serde(default)]
    pub locale_path: Option<PathBuf>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// The permanent identifier of the document, 32 characters long.
    #[serde(default = "default_document_identifier")]
    pub document_identifier: String,
    /// The identifier of this particular revision of the document, 32 characters long.
    #[serde(default = "default_instance_identifier")]
    pub instance_identifier: String,
    /// Whether the streams of the document are compressed before saving.
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("label.pdf")
}

fn default_document_identifier() -> String {
    "NutritionFactsLabelDocument00001".into()
}

fn default_instance_identifier() -> String {
    "NutritionFactsLabelInstance00001".into()
}

fn default_compress() -> bool {
    true
}

impl LabelConfiguration {
    pub fn new(fonts: FontResources) -> LabelConfiguration {
        LabelConfiguration {
            fonts,
            locale_path: None,
            output_path: default_output_path(),
            document_identifier: default_document_identifier(),
            instance_identifier: default_instance_identifier(),
            compress: default_compress(),
        }
    }

    pub fn from_path(configuration_path: &Path) -> Result<Self, LabelError> {
        let configuration_content = std::fs::read_to_string(configuration_path).map_err(|error| {
            LabelError::Configuration(ContextError::with_error(
                format!("Failed to read the configuration file {:?}", configuration_path),
                &error,
            ))
        })?;
        let configuration: LabelConfiguration = serde_json::from_str(&configuration_content)
            .map_err(|error| {
                LabelError::Configuration(ContextError::with_error(
                    format!("Failed to parse the configuration file {:?}", configuration_path),
                    &error,
                ))
            })?;
        configuration.validate()?;

        Ok(configuration)
    }

    /// Checks that both identifiers have the 32 characters the document trailer expects.
    pub fn validate(&self) -> Result<(), LabelError> {
        for (name, identifier) in [
            ("document", &self.document_identifier),
            ("instance", &self.instance_identifier),
        ] {
            if identifier.len() != 32 || !identifier.is_ascii() {
                return Err(LabelError::Configuration(ContextError::with_context(format!(
                    "The {} identifier {:?} must be made of 32 ASCII characters",
                    name, identifier
                ))));
            }
        }

        Ok(())
    }

    /// The label text named by the configuration, or the built-in one.
    pub fn label_text(&self) -> Result<LabelText, LabelError> {
        match &self.locale_path {
            Some(locale_path) => LabelText::from_path(locale_path),
            None => LabelText::russian(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_their_defaults() {
        let configuration: LabelConfiguration = serde_json::from_str(
            r#"{ "fonts": { "regular": "fonts/DejaVuSans.ttf", "bold": "fonts/DejaVuSans-Bold.ttf" } }"#,
        )
        .unwrap();

        assert_eq!(
            configuration,
            LabelConfiguration::new(FontResources {
                regular: "fonts/DejaVuSans.ttf".into(),
                bold: "fonts/DejaVuSans-Bold.ttf".into(),
            })
        );
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.output_path, PathBuf::from("label.pdf"));
    }

    #[test]
    fn short_identifiers_are_rejected() {
        let mut configuration = LabelConfiguration::new(FontResources {
            regular: "regular.ttf".into(),
            bold: "bold.ttf".into(),
        });
        configuration.instance_identifier = "short".into();

        assert!(matches!(
            configuration.validate(),
            Err(LabelError::Configuration(_))
        ));
    }

    #[test]
    fn unreadable_locale_is_a_configuration_error() {
        let mut configuration = LabelConfiguration::new(FontResources {
            regular: "regular.ttf".into(),
            bold: "bold.ttf".into(),
        });
        configuration.locale_path = Some("does/not/exist.json".into());

        assert!(matches!(
            configuration.label_text(),
            Err(LabelError::Configuration(_))
        ));
    }
}
