use rand::Rng as _;
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use nutrilabel::{
    build_label_content, build_rows, build_style_directives, compute_percent, LabelError,
    LabelText, NutrientAmount, NutrientInput, NutrientKey, RowKind, DAILY_VALUES,
};

fn russian_text() -> LabelText {
    LabelText::russian().unwrap()
}

fn percent_of(input: &NutrientInput, key: NutrientKey) -> String {
    build_rows(input, &russian_text())
        .into_iter()
        .find(|row| row.kind == RowKind::Nutrient(key))
        .unwrap()
        .secondary_text
}

#[test]
fn label_scenarios() {
    let scenarios = [
        (NutrientKey::TotalFat, "12", "15%"),
        (NutrientKey::Sodium, "470", "20%"),
        (NutrientKey::Calcium, "260", "20%"),
        (NutrientKey::Iron, "1.2", "6%"),
        (NutrientKey::TransFat, "5", ""),
        (NutrientKey::TotalSugars, "40", ""),
        (NutrientKey::Protein, "25", ""),
    ];

    for (key, amount, expected_percent) in scenarios {
        let input = NutrientInput::default().with_amount(key, amount).unwrap();

        assert_eq!(percent_of(&input, key), expected_percent, "{:?} = {:?}", key, amount);
    }
}

#[test]
fn absent_potassium_reads_zero_percent() {
    let rows = build_rows(&NutrientInput::default(), &russian_text());
    let potassium_row = rows.last().unwrap();

    assert_eq!(potassium_row.kind, RowKind::Nutrient(NutrientKey::Potassium));
    assert_eq!(potassium_row.primary_text, "Калий мг");
    assert_eq!(potassium_row.secondary_text, "0%");
}

#[test]
fn percentages_are_floored_for_random_amounts() {
    let mut rng = rand::thread_rng();

    for _ in 0..2000 {
        let key = NutrientKey::ALL[rng.gen_range(0..NutrientKey::ALL.len())];
        let hundredths: u64 = rng.gen_range(0..1_000_000);
        let text = format!("{}.{:02}", hundredths / 100, hundredths % 100);
        let amount = NutrientAmount::parse(key, &text).unwrap();

        // Every reference is a whole number of tenths, so the exact floor is an integer division
        let reference_tenths = (DAILY_VALUES.reference(key) * Decimal::TEN).to_u64().unwrap();
        let expected_percent = hundredths * 10 / reference_tenths;

        assert_eq!(
            compute_percent(key, amount.as_ref()),
            format!("{}%", expected_percent),
            "{:?} {}",
            key,
            text
        );
    }
}

#[test]
fn whole_percentages_stay_whole() {
    let scenarios = [
        (NutrientKey::AddedSugars, "14.5", "29%"),
        (NutrientKey::Sodium, "667", "29%"),
        (NutrientKey::DietaryFiber, "16.24", "58%"),
    ];

    for (key, amount, expected_percent) in scenarios {
        let input = NutrientInput::default().with_amount(key, amount).unwrap();

        assert_eq!(percent_of(&input, key), expected_percent, "{:?} = {:?}", key, amount);
    }
}

#[test]
fn random_amounts_are_printed_verbatim() {
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let decimals = rng.gen_range(0..4);
        let amounts: Vec<(NutrientKey, String)> = NutrientKey::ALL
            .into_iter()
            .map(|key| (key, format!("{:.*}", decimals, rng.gen_range(0.0..500.0))))
            .collect();
        let input = amounts
            .iter()
            .try_fold(NutrientInput::new("1 шт", "120"), |input, (key, text)| {
                input.with_amount(*key, text)
            })
            .unwrap();

        let rows = build_rows(&input, &russian_text());
        assert_eq!(rows.len(), 17);
        for ((key, text), row) in amounts.iter().zip(rows.iter().skip(3)) {
            assert_eq!(row.kind, RowKind::Nutrient(*key));
            assert!(
                row.primary_text.contains(&format!(" {}", text)),
                "{:?} does not contain {:?}",
                row.primary_text,
                text
            );
            if !key.shows_percent() {
                assert_eq!(row.secondary_text, "");
            }
        }
    }
}

#[test]
fn json_input_builds_the_same_label_as_typed_input() {
    let json_input = NutrientInput::from_json_str(
        r#"{
            "serving_size": "100г",
            "calories": "250",
            "total_fat": 12,
            "sodium": "470",
            "iron": "1.2"
        }"#,
    )
    .unwrap();
    let typed_input = NutrientInput::new("100г", "250")
        .with_amount(NutrientKey::TotalFat, "12")
        .and_then(|input| input.with_amount(NutrientKey::Sodium, "470"))
        .and_then(|input| input.with_amount(NutrientKey::Iron, "1.2"))
        .unwrap();

    let text = russian_text();
    similar_asserts::assert_eq!(
        build_label_content(&json_input, &text),
        build_label_content(&typed_input, &text)
    );
}

#[test]
fn malformed_amount_is_reported_before_rendering() {
    let error = NutrientInput::from_json_str(r#"{ "calcium": "260mg" }"#).unwrap_err();

    assert_eq!(
        error,
        LabelError::InputFormat {
            field: NutrientKey::Calcium,
            value: "260mg".into(),
        }
    );
}

#[test]
fn style_directives_are_independent_of_the_input() {
    let text = russian_text();
    let empty = build_label_content(&NutrientInput::default(), &text);
    let filled = build_label_content(
        &NutrientInput::new("250мл", "110")
            .with_amount(NutrientKey::AddedSugars, "9")
            .unwrap(),
        &text,
    );

    assert_eq!(empty.directives, filled.directives);
    assert_eq!(empty.directives, build_style_directives());
    assert_ne!(empty.rows, filled.rows);
}
