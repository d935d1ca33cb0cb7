use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{ContextError, LabelError};
use crate::nutrient::{NutrientKey, Unit};

/// The built-in Russian text of the label.
const RUSSIAN_LOCALE: &str = include_str!("../assets/locale/ru.json");

/// The localized symbols of the mass units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitText {
    pub grams: String,
    pub milligrams: String,
    pub micrograms: String,
}

impl UnitText {
    pub fn symbol(&self, unit: Unit) -> &str {
        match unit {
            Unit::Grams => &self.grams,
            Unit::Milligrams => &self.milligrams,
            Unit::Micrograms => &self.micrograms,
        }
    }
}

/// The label of a single nutrient row, optionally indented to mark a sub-nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientText {
    pub label: String,
    #[serde(default)]
    pub indent: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLabelText {
    header: String,
    serving_size: String,
    calories: String,
    percent_daily_value: String,
    footer: String,
    units: UnitText,
    nutrients: BTreeMap<String, NutrientText>,
}

/// Every piece of static text printed on a label.
///
/// Instances are always complete: construction fails with a configuration error when a
/// nutrient is unknown or has no label, so the row builder can look up any key.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelText {
    pub header: String,
    pub serving_size: String,
    pub calories: String,
    pub percent_daily_value: String,
    pub footer: String,
    pub units: UnitText,
    nutrients: Vec<NutrientText>,
}

impl LabelText {
    /// The Russian text the label is printed with by default.
    pub fn russian() -> Result<LabelText, LabelError> {
        LabelText::from_json_str(RUSSIAN_LOCALE)
    }

    pub fn from_json_str(json: &str) -> Result<LabelText, LabelError> {
        let raw_text: RawLabelText = serde_json::from_str(json).map_err(|error| {
            LabelError::Configuration(ContextError::with_error(
                "Unable to parse the label text",
                &error,
            ))
        })?;

        let mut nutrients_by_key = BTreeMap::new();
        for (name, nutrient_text) in raw_text.nutrients {
            let key = name.parse::<NutrientKey>()?;
            nutrients_by_key.insert(key, nutrient_text);
        }

        let mut nutrients = Vec::with_capacity(NutrientKey::ALL.len());
        for key in NutrientKey::ALL {
            let nutrient_text = nutrients_by_key.remove(&key).ok_or_else(|| {
                LabelError::Configuration(ContextError::with_context(format!(
                    "The label text has no entry for the nutrient {:?}",
                    key.name()
                )))
            })?;
            nutrients.push(nutrient_text);
        }

        Ok(LabelText {
            header: raw_text.header,
            serving_size: raw_text.serving_size,
            calories: raw_text.calories,
            percent_daily_value: raw_text.percent_daily_value,
            footer: raw_text.footer,
            units: raw_text.units,
            nutrients,
        })
    }

    pub fn from_path(locale_path: &Path) -> Result<LabelText, LabelError> {
        let locale_content = std::fs::read_to_string(locale_path).map_err(|error| {
            LabelError::Configuration(ContextError::with_error(
                format!("Unable to read the label text {:?}", locale_path),
                &error,
            ))
        })?;

        LabelText::from_json_str(&locale_content)
    }

    pub fn nutrient(&self, key: NutrientKey) -> &NutrientText {
        &self.nutrients[key as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_text_is_complete() {
        let text = LabelText::russian().unwrap();

        assert_eq!(text.header, "Пищевая Ценность");
        assert_eq!(text.nutrient(NutrientKey::AddedSugars).indent, 5);
        assert_eq!(text.nutrient(NutrientKey::Potassium).label, "Калий");
        assert_eq!(text.units.symbol(Unit::Micrograms), "мкг");
    }

    #[test]
    fn missing_nutrient_is_a_configuration_error() {
        let mut json: serde_json::Value = serde_json::from_str(RUSSIAN_LOCALE).unwrap();
        json["nutrients"].as_object_mut().unwrap().remove("iron");

        let error = LabelText::from_json_str(&json.to_string()).unwrap_err();

        match error {
            LabelError::Configuration(error) => assert!(error.context.contains("iron")),
            error => panic!("unexpected error {:?}", error),
        }
    }

    #[test]
    fn unknown_nutrient_is_a_configuration_error() {
        let mut json: serde_json::Value = serde_json::from_str(RUSSIAN_LOCALE).unwrap();
        json["nutrients"]["zinc"] = serde_json::json!({ "label": "Цинк" });

        assert!(matches!(
            LabelText::from_json_str(&json.to_string()),
            Err(LabelError::Configuration(_))
        ));
    }
}
