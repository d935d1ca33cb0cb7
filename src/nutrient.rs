use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ContextError, LabelError};

/// The nutrients listed on the label, in the order in which their rows appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientKey {
    TotalFat,
    SaturatedFat,
    TransFat,
    Cholesterol,
    Sodium,
    TotalCarb,
    DietaryFiber,
    TotalSugars,
    AddedSugars,
    Protein,
    VitaminD,
    Calcium,
    Iron,
    Potassium,
}

/// The mass unit a nutrient amount is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unit {
    Grams,
    Milligrams,
    Micrograms,
}

/// How strongly the label row of a nutrient is set apart from its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Bold, with a slightly larger label (the first row of a group).
    Headline,
    /// Bold at the regular table size.
    Bold,
    /// Regular weight, typically an indented sub-nutrient.
    Regular,
}

impl NutrientKey {
    /// All the nutrient keys, in label order.
    pub const ALL: [NutrientKey; 14] = [
        NutrientKey::TotalFat,
        NutrientKey::SaturatedFat,
        NutrientKey::TransFat,
        NutrientKey::Cholesterol,
        NutrientKey::Sodium,
        NutrientKey::TotalCarb,
        NutrientKey::DietaryFiber,
        NutrientKey::TotalSugars,
        NutrientKey::AddedSugars,
        NutrientKey::Protein,
        NutrientKey::VitaminD,
        NutrientKey::Calcium,
        NutrientKey::Iron,
        NutrientKey::Potassium,
    ];

    /// The snake case name of the key, as used in the JSON files.
    pub fn name(&self) -> &'static str {
        match self {
            NutrientKey::TotalFat => "total_fat",
            NutrientKey::SaturatedFat => "saturated_fat",
            NutrientKey::TransFat => "trans_fat",
            NutrientKey::Cholesterol => "cholesterol",
            NutrientKey::Sodium => "sodium",
            NutrientKey::TotalCarb => "total_carb",
            NutrientKey::DietaryFiber => "dietary_fiber",
            NutrientKey::TotalSugars => "total_sugars",
            NutrientKey::AddedSugars => "added_sugars",
            NutrientKey::Protein => "protein",
            NutrientKey::VitaminD => "vitamin_d",
            NutrientKey::Calcium => "calcium",
            NutrientKey::Iron => "iron",
            NutrientKey::Potassium => "potassium",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            NutrientKey::Cholesterol
            | NutrientKey::Sodium
            | NutrientKey::Calcium
            | NutrientKey::Iron
            | NutrientKey::Potassium => Unit::Milligrams,
            NutrientKey::VitaminD => Unit::Micrograms,
            _ => Unit::Grams,
        }
    }

    /// Whether the row of this nutrient shows its percent of daily value. Trans fat,
    /// total sugars and protein are listed by amount only.
    pub fn shows_percent(&self) -> bool {
        !matches!(
            self,
            NutrientKey::TransFat | NutrientKey::TotalSugars | NutrientKey::Protein
        )
    }

    pub fn emphasis(&self) -> Emphasis {
        match self {
            NutrientKey::TotalFat | NutrientKey::Cholesterol | NutrientKey::Protein => {
                Emphasis::Headline
            }
            NutrientKey::Sodium | NutrientKey::TotalCarb => Emphasis::Bold,
            _ => Emphasis::Regular,
        }
    }

    /// Vitamins and minerals, listed in their own block below protein.
    pub fn is_micronutrient(&self) -> bool {
        matches!(
            self,
            NutrientKey::VitaminD | NutrientKey::Calcium | NutrientKey::Iron | NutrientKey::Potassium
        )
    }
}

impl std::str::FromStr for NutrientKey {
    type Err = LabelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        NutrientKey::ALL
            .into_iter()
            .find(|key| key.name() == name)
            .ok_or_else(|| {
                LabelError::Configuration(ContextError::with_context(format!(
                    "Unknown nutrient key {:?}",
                    name
                )))
            })
    }
}

/// The largest amount accepted for any nutrient, in the unit of the nutrient.
pub const MAXIMUM_AMOUNT: f64 = 1_000_000_000.0;

/// A nutrient amount as supplied by the caller. The original text is kept for display
/// on the label while the parsed decimal value is used for the percentage computation.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientAmount {
    text: String,
    value: Decimal,
}

impl NutrientAmount {
    /// Parses the amount of the given nutrient.
    ///
    /// Empty text means that the amount is absent. Text made of whitespace only is kept for
    /// display and counts as zero. Anything else must be a decimal number between zero and
    /// `MAXIMUM_AMOUNT`.
    pub fn parse(field: NutrientKey, text: &str) -> Result<Option<NutrientAmount>, LabelError> {
        if text.is_empty() {
            return Ok(None);
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Ok(Some(NutrientAmount {
                text: text.to_string(),
                value: Decimal::ZERO,
            }));
        }

        let input_format_error = || LabelError::InputFormat {
            field,
            value: text.to_string(),
        };
        let float_value = trimmed_text
            .parse::<f64>()
            .map_err(|_| input_format_error())?;
        if !float_value.is_finite() || !(0.0..=MAXIMUM_AMOUNT).contains(&float_value) {
            return Err(input_format_error());
        }

        // The float is only used for validation, the percentage needs the exact decimal
        let value = trimmed_text
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(trimmed_text))
            .or_else(|_| Decimal::try_from(float_value))
            .map_err(|_| input_format_error())?;

        Ok(Some(NutrientAmount {
            text: text.to_string(),
            value,
        }))
    }

    /// Constructs an amount from an already numeric value, printed in its shortest form.
    pub fn from_value(field: NutrientKey, value: f64) -> Result<NutrientAmount, LabelError> {
        let text = value.to_string();
        NutrientAmount::parse(field, &text)?.ok_or(LabelError::InputFormat { field, value: text })
    }

    /// The amount exactly as it was supplied.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> Decimal {
        self.value
    }
}

/// The sixteen fields printed on a label. Serving size and calories are free-form text,
/// the other fourteen are optional amounts which are validated on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NutrientInput {
    pub serving_size: String,
    pub calories: String,
    pub total_fat: Option<NutrientAmount>,
    pub saturated_fat: Option<NutrientAmount>,
    pub trans_fat: Option<NutrientAmount>,
    pub cholesterol: Option<NutrientAmount>,
    pub sodium: Option<NutrientAmount>,
    pub total_carb: Option<NutrientAmount>,
    pub dietary_fiber: Option<NutrientAmount>,
    pub total_sugars: Option<NutrientAmount>,
    pub added_sugars: Option<NutrientAmount>,
    pub protein: Option<NutrientAmount>,
    pub vitamin_d: Option<NutrientAmount>,
    pub calcium: Option<NutrientAmount>,
    pub iron: Option<NutrientAmount>,
    pub potassium: Option<NutrientAmount>,
}

impl NutrientInput {
    pub fn new<S: Into<String>, T: Into<String>>(serving_size: S, calories: T) -> NutrientInput {
        NutrientInput {
            serving_size: serving_size.into(),
            calories: calories.into(),
            ..Default::default()
        }
    }

    /// Sets the amount of a nutrient from its textual form, blank text clears it.
    pub fn with_amount(mut self, key: NutrientKey, text: &str) -> Result<NutrientInput, LabelError> {
        *self.amount_mut(key) = NutrientAmount::parse(key, text)?;
        Ok(self)
    }

    pub fn amount(&self, key: NutrientKey) -> Option<&NutrientAmount> {
        match key {
            NutrientKey::TotalFat => self.total_fat.as_ref(),
            NutrientKey::SaturatedFat => self.saturated_fat.as_ref(),
            NutrientKey::TransFat => self.trans_fat.as_ref(),
            NutrientKey::Cholesterol => self.cholesterol.as_ref(),
            NutrientKey::Sodium => self.sodium.as_ref(),
            NutrientKey::TotalCarb => self.total_carb.as_ref(),
            NutrientKey::DietaryFiber => self.dietary_fiber.as_ref(),
            NutrientKey::TotalSugars => self.total_sugars.as_ref(),
            NutrientKey::AddedSugars => self.added_sugars.as_ref(),
            NutrientKey::Protein => self.protein.as_ref(),
            NutrientKey::VitaminD => self.vitamin_d.as_ref(),
            NutrientKey::Calcium => self.calcium.as_ref(),
            NutrientKey::Iron => self.iron.as_ref(),
            NutrientKey::Potassium => self.potassium.as_ref(),
        }
    }

    pub fn amount_mut(&mut self, key: NutrientKey) -> &mut Option<NutrientAmount> {
        match key {
            NutrientKey::TotalFat => &mut self.total_fat,
            NutrientKey::SaturatedFat => &mut self.saturated_fat,
            NutrientKey::TransFat => &mut self.trans_fat,
            NutrientKey::Cholesterol => &mut self.cholesterol,
            NutrientKey::Sodium => &mut self.sodium,
            NutrientKey::TotalCarb => &mut self.total_carb,
            NutrientKey::DietaryFiber => &mut self.dietary_fiber,
            NutrientKey::TotalSugars => &mut self.total_sugars,
            NutrientKey::AddedSugars => &mut self.added_sugars,
            NutrientKey::Protein => &mut self.protein,
            NutrientKey::VitaminD => &mut self.vitamin_d,
            NutrientKey::Calcium => &mut self.calcium,
            NutrientKey::Iron => &mut self.iron,
            NutrientKey::Potassium => &mut self.potassium,
        }
    }

    /// Parses the input from a JSON object whose keys are the snake case field names.
    /// Every field may be given either as a string or as a number.
    pub fn from_json_str(json: &str) -> Result<NutrientInput, LabelError> {
        let raw_input: RawNutrientInput = serde_json::from_str(json).map_err(|error| {
            LabelError::Configuration(ContextError::with_error(
                "Unable to parse the nutrient input",
                &error,
            ))
        })?;

        raw_input.try_into()
    }

    pub fn from_path(input_path: &Path) -> Result<NutrientInput, LabelError> {
        let input_content = std::fs::read_to_string(input_path).map_err(|error| {
            LabelError::Configuration(ContextError::with_error(
                format!("Unable to read the nutrient input {:?}", input_path),
                &error,
            ))
        })?;

        NutrientInput::from_json_str(&input_content)
    }
}

/// A JSON value which is accepted wherever the label expects an amount or free-form text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(serde_json::Number),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNutrientInput {
    #[serde(default)]
    serving_size: Option<RawValue>,
    #[serde(default)]
    calories: Option<RawValue>,
    #[serde(default)]
    total_fat: Option<RawValue>,
    #[serde(default)]
    saturated_fat: Option<RawValue>,
    #[serde(default)]
    trans_fat: Option<RawValue>,
    #[serde(default)]
    cholesterol: Option<RawValue>,
    #[serde(default)]
    sodium: Option<RawValue>,
    #[serde(default)]
    total_carb: Option<RawValue>,
    #[serde(default)]
    dietary_fiber: Option<RawValue>,
    #[serde(default)]
    total_sugars: Option<RawValue>,
    #[serde(default)]
    added_sugars: Option<RawValue>,
    #[serde(default)]
    protein: Option<RawValue>,
    #[serde(default)]
    vitamin_d: Option<RawValue>,
    #[serde(default)]
    calcium: Option<RawValue>,
    #[serde(default)]
    iron: Option<RawValue>,
    #[serde(default)]
    potassium: Option<RawValue>,
}

impl TryFrom<RawNutrientInput> for NutrientInput {
    type Error = LabelError;

    fn try_from(raw_input: RawNutrientInput) -> Result<Self, Self::Error> {
        let RawNutrientInput {
            serving_size,
            calories,
            total_fat,
            saturated_fat,
            trans_fat,
            cholesterol,
            sodium,
            total_carb,
            dietary_fiber,
            total_sugars,
            added_sugars,
            protein,
            vitamin_d,
            calcium,
            iron,
            potassium,
        } = raw_input;

        let raw_amounts = [
            total_fat,
            saturated_fat,
            trans_fat,
            cholesterol,
            sodium,
            total_carb,
            dietary_fiber,
            total_sugars,
            added_sugars,
            protein,
            vitamin_d,
            calcium,
            iron,
            potassium,
        ];

        let mut input = NutrientInput::new(
            serving_size.map(RawValue::into_text).unwrap_or_default(),
            calories.map(RawValue::into_text).unwrap_or_default(),
        );
        for (key, raw_amount) in NutrientKey::ALL.into_iter().zip(raw_amounts) {
            if let Some(raw_amount) = raw_amount {
                *input.amount_mut(key) = NutrientAmount::parse(key, &raw_amount.into_text())?;
            }
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_round_trip_through_from_str() {
        for key in NutrientKey::ALL {
            assert_eq!(key.name().parse::<NutrientKey>(), Ok(key));
        }
    }

    #[test]
    fn unknown_key_is_a_configuration_error() {
        let error = "fiber".parse::<NutrientKey>().unwrap_err();

        assert!(matches!(error, LabelError::Configuration(_)));
    }

    #[test]
    fn only_three_nutrients_hide_their_percentage() {
        let hidden: Vec<_> = NutrientKey::ALL
            .into_iter()
            .filter(|key| !key.shows_percent())
            .collect();

        assert_eq!(
            hidden,
            vec![
                NutrientKey::TransFat,
                NutrientKey::TotalSugars,
                NutrientKey::Protein
            ]
        );
    }

    #[test]
    fn amount_keeps_the_original_text() {
        let amount = NutrientAmount::parse(NutrientKey::Iron, "1.20").unwrap().unwrap();

        assert_eq!(amount.text(), "1.20");
        assert_eq!(amount.value(), Decimal::new(12, 1));
    }

    #[test]
    fn empty_amount_is_absent() {
        assert_eq!(NutrientAmount::parse(NutrientKey::Sodium, ""), Ok(None));
    }

    #[test]
    fn whitespace_amount_is_kept_as_zero() {
        let amount = NutrientAmount::parse(NutrientKey::Sodium, "   ").unwrap().unwrap();

        assert_eq!(amount.text(), "   ");
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn scientific_notation_is_read_exactly() {
        let amount = NutrientAmount::parse(NutrientKey::Sodium, "1.5e3").unwrap().unwrap();

        assert_eq!(amount.text(), "1.5e3");
        assert_eq!(amount.value(), Decimal::from(1500));
    }

    #[test]
    fn amounts_above_the_limit_are_rejected() {
        for text in ["1e300", "1000000001"] {
            assert_eq!(
                NutrientAmount::parse(NutrientKey::Sodium, text),
                Err(LabelError::InputFormat {
                    field: NutrientKey::Sodium,
                    value: text.to_string(),
                })
            );
        }
        assert!(NutrientAmount::parse(NutrientKey::Sodium, "1000000000").is_ok());
        assert!(NutrientAmount::from_value(NutrientKey::Sodium, 1e300).is_err());
    }

    #[test]
    fn malformed_amounts_are_rejected() {
        for text in ["1,2", "abc", "-3", "NaN", "inf", "12g"] {
            assert_eq!(
                NutrientAmount::parse(NutrientKey::Calcium, text),
                Err(LabelError::InputFormat {
                    field: NutrientKey::Calcium,
                    value: text.to_string(),
                }),
                "{:?} should have been rejected",
                text
            );
        }
    }

    #[test]
    fn numeric_amount_is_displayed_without_trailing_zeros() {
        let amount = NutrientAmount::from_value(NutrientKey::TotalFat, 12.0).unwrap();

        assert_eq!(amount.text(), "12");
        assert!(NutrientAmount::from_value(NutrientKey::TotalFat, -1.0).is_err());
    }

    #[test]
    fn json_input_accepts_strings_and_numbers() {
        let input = NutrientInput::from_json_str(
            r#"{
                "serving_size": "100г",
                "calories": 250,
                "total_fat": "12",
                "iron": 1.2,
                "potassium": null,
                "sodium": ""
            }"#,
        )
        .unwrap();

        assert_eq!(input.serving_size, "100г");
        assert_eq!(input.calories, "250");
        assert_eq!(input.amount(NutrientKey::TotalFat).unwrap().text(), "12");
        assert_eq!(input.amount(NutrientKey::Iron).unwrap().text(), "1.2");
        assert_eq!(input.amount(NutrientKey::Potassium), None);
        assert_eq!(input.amount(NutrientKey::Sodium), None);
        assert_eq!(input.amount(NutrientKey::Protein), None);
    }

    #[test]
    fn json_input_rejects_unknown_fields_and_bad_amounts() {
        assert!(matches!(
            NutrientInput::from_json_str(r#"{ "totalfat": "12" }"#),
            Err(LabelError::Configuration(_))
        ));
        assert_eq!(
            NutrientInput::from_json_str(r#"{ "protein": "five" }"#),
            Err(LabelError::InputFormat {
                field: NutrientKey::Protein,
                value: "five".into(),
            })
        );
    }

    #[test]
    fn with_amount_sets_and_clears_fields() {
        let input = NutrientInput::new("1 шт", "90")
            .with_amount(NutrientKey::VitaminD, "2")
            .unwrap();
        assert_eq!(input.vitamin_d.as_ref().map(NutrientAmount::text), Some("2"));

        let input = input.with_amount(NutrientKey::VitaminD, "").unwrap();
        assert_eq!(input.vitamin_d, None);
    }
}
