use crate::daily_value::compute_percent;
use crate::locale::LabelText;
use crate::nutrient::{NutrientAmount, NutrientInput, NutrientKey};
use crate::style::{build_style_directives, StyleDirective};

/// What a row of the nutrition table stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    ServingSize,
    Calories,
    /// The row holding the "% daily value" column heading.
    PercentHeader,
    Nutrient(NutrientKey),
}

/// The kinds of the table rows, top to bottom. The order is fixed and independent of the input.
pub fn row_kinds() -> impl Iterator<Item = RowKind> {
    [RowKind::ServingSize, RowKind::Calories, RowKind::PercentHeader]
        .into_iter()
        .chain(NutrientKey::ALL.into_iter().map(RowKind::Nutrient))
}

/// One line of the nutrition table: the description in the first column and the
/// value (or percent of daily value) in the second one.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRow {
    pub kind: RowKind,
    pub primary_text: String,
    pub secondary_text: String,
}

/// Builds the seventeen rows of the table from the input.
///
/// Amounts are printed exactly as they were supplied, whitespace included, followed by the
/// unit symbol; an absent amount leaves only the unit. Trans fat, total sugars and protein never print a
/// percentage.
pub fn build_rows(input: &NutrientInput, text: &LabelText) -> Vec<LabelRow> {
    row_kinds()
        .map(|kind| {
            let (primary_text, secondary_text) = match kind {
                RowKind::ServingSize => (text.serving_size.clone(), input.serving_size.clone()),
                RowKind::Calories => (text.calories.clone(), input.calories.clone()),
                RowKind::PercentHeader => (String::new(), text.percent_daily_value.clone()),
                RowKind::Nutrient(key) => {
                    let amount = input.amount(key);
                    let nutrient_text = text.nutrient(key);
                    let primary_text = format!(
                        "{}{} {}{}",
                        " ".repeat(nutrient_text.indent),
                        nutrient_text.label,
                        amount.map(NutrientAmount::text).unwrap_or_default(),
                        text.units.symbol(key.unit()),
                    );
                    let secondary_text = if key.shows_percent() {
                        compute_percent(key, amount)
                    } else {
                        String::new()
                    };

                    (primary_text, secondary_text)
                }
            };

            LabelRow {
                kind,
                primary_text,
                secondary_text,
            }
        })
        .collect()
}

/// Everything the renderer needs to draw a label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelContent {
    pub header: String,
    pub rows: Vec<LabelRow>,
    pub directives: Vec<StyleDirective>,
    pub footer: String,
}

pub fn build_label_content(input: &NutrientInput, text: &LabelText) -> LabelContent {
    LabelContent {
        header: text.header.clone(),
        rows: build_rows(input, text),
        directives: build_style_directives(),
        footer: text.footer.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> NutrientInput {
        let amounts = [
            (NutrientKey::TotalFat, "12"),
            (NutrientKey::SaturatedFat, "3"),
            (NutrientKey::TransFat, "0"),
            (NutrientKey::Cholesterol, "30"),
            (NutrientKey::Sodium, "470"),
            (NutrientKey::TotalCarb, "31"),
            (NutrientKey::DietaryFiber, "2"),
            (NutrientKey::TotalSugars, "1"),
            (NutrientKey::AddedSugars, "0"),
            (NutrientKey::Protein, "5"),
            (NutrientKey::VitaminD, "2"),
            (NutrientKey::Calcium, "260"),
            (NutrientKey::Iron, "1.2"),
            (NutrientKey::Potassium, "35"),
        ];

        amounts
            .into_iter()
            .try_fold(NutrientInput::new("100г", "250"), |input, (key, text)| {
                input.with_amount(key, text)
            })
            .unwrap()
    }

    fn row(rows: &[LabelRow], kind: RowKind) -> &LabelRow {
        rows.iter().find(|row| row.kind == kind).unwrap()
    }

    #[test]
    fn sample_label_rows() {
        let rows = build_rows(&sample_input(), &LabelText::russian().unwrap());
        let texts: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.primary_text.as_str(), row.secondary_text.as_str()))
            .collect();

        similar_asserts::assert_eq!(
            texts,
            vec![
                ("Размер порции", "100г"),
                ("Калории", "250"),
                ("", "% Дневной Нормы*"),
                ("Всего жиров 12г", "15%"),
                (" Насыщенные жиры 3г", "15%"),
                (" Транс-жиры 0г", ""),
                ("Холестерин 30мг", "10%"),
                ("Натрий 470мг", "20%"),
                ("Всего углеводов 31г", "11%"),
                (" Пищевые волокна 2г", "7%"),
                (" Всего сахаров 1г", ""),
                ("     Добавленные сахара 0г", "0%"),
                ("Белки 5г", ""),
                ("Витамин Д 2мкг", "10%"),
                ("Кальций 260мг", "20%"),
                ("Железо 1.2мг", "6%"),
                ("Калий 35мг", "0%"),
            ]
        );
    }

    #[test]
    fn row_order_is_fixed() {
        let kinds: Vec<_> = row_kinds().collect();

        assert_eq!(kinds.len(), 17);
        assert_eq!(kinds[0], RowKind::ServingSize);
        assert_eq!(kinds[1], RowKind::Calories);
        assert_eq!(kinds[2], RowKind::PercentHeader);
        assert_eq!(kinds[12], RowKind::Nutrient(NutrientKey::Protein));
        assert_eq!(kinds[16], RowKind::Nutrient(NutrientKey::Potassium));
    }

    #[test]
    fn trans_fat_never_shows_a_percentage() {
        let input = NutrientInput::default()
            .with_amount(NutrientKey::TransFat, "5")
            .unwrap();
        let rows = build_rows(&input, &LabelText::russian().unwrap());

        let trans_fat_row = row(&rows, RowKind::Nutrient(NutrientKey::TransFat));
        assert_eq!(trans_fat_row.primary_text, " Транс-жиры 5г");
        assert_eq!(trans_fat_row.secondary_text, "");
    }

    #[test]
    fn absent_amount_prints_the_unit_only() {
        let rows = build_rows(&NutrientInput::default(), &LabelText::russian().unwrap());

        let potassium_row = row(&rows, RowKind::Nutrient(NutrientKey::Potassium));
        assert_eq!(potassium_row.primary_text, "Калий мг");
        assert_eq!(potassium_row.secondary_text, "0%");
        assert_eq!(row(&rows, RowKind::ServingSize).secondary_text, "");
    }

    #[test]
    fn whitespace_amount_is_printed_verbatim() {
        let input = NutrientInput::default()
            .with_amount(NutrientKey::Potassium, "  ")
            .unwrap();
        let rows = build_rows(&input, &LabelText::russian().unwrap());

        let potassium_row = row(&rows, RowKind::Nutrient(NutrientKey::Potassium));
        assert_eq!(potassium_row.primary_text, "Калий   мг");
        assert_eq!(potassium_row.secondary_text, "0%");
    }

    #[test]
    fn content_is_rebuilt_identically() {
        let text = LabelText::russian().unwrap();
        let input = sample_input();

        assert_eq!(
            build_label_content(&input, &text),
            build_label_content(&input, &text)
        );
    }
}
