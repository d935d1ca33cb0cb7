use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::nutrient::{NutrientAmount, NutrientKey, Unit};

/// The reference daily intake of every nutrient for a 2000 calorie diet.
///
/// The table is indexed by `NutrientKey`, so a lookup can never miss. Trans fat has no
/// established daily value on most labels; its entry follows the WHO ceiling of 1% of the
/// energy intake, and its row never prints a percentage anyway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyValueTable {
    references: [Decimal; 14],
}

/// A reference amount given in tenths of its unit.
const fn tenths(value: u32) -> Decimal {
    Decimal::from_parts(value, 0, 0, false, 1)
}

/// The table every label is computed against.
pub const DAILY_VALUES: DailyValueTable = DailyValueTable {
    references: [
        tenths(780),   // total fat, g
        tenths(200),   // saturated fat, g
        tenths(22),    // trans fat, g
        tenths(3000),  // cholesterol, mg
        tenths(23000), // sodium, mg
        tenths(2750),  // total carbohydrate, g
        tenths(280),   // dietary fiber, g
        tenths(500),   // total sugars, g
        tenths(500),   // added sugars, g
        tenths(500),   // protein, g
        tenths(200),   // vitamin D, mcg
        tenths(13000), // calcium, mg
        tenths(180),   // iron, mg
        tenths(47000), // potassium, mg
    ],
};

impl DailyValueTable {
    /// The daily reference amount of a nutrient, expressed in the unit of the nutrient.
    pub fn reference(&self, key: NutrientKey) -> Decimal {
        self.references[key as usize]
    }

    pub fn unit(&self, key: NutrientKey) -> Unit {
        key.unit()
    }

    /// Formats the share of the daily reference as an integer percentage, that is
    /// `floor(100 * amount / reference)`. An absent amount counts as zero.
    pub fn percent(&self, key: NutrientKey, amount: Option<&NutrientAmount>) -> String {
        let value = amount.map(NutrientAmount::value).unwrap_or(Decimal::ZERO);
        let percent = floor_ratio(value * Decimal::ONE_HUNDRED, self.reference(key));

        format!("{}%", percent)
    }
}

/// The integer part of `numerator / denominator` for non-negative operands.
///
/// The quotient of the division is rounded to the precision of `Decimal`, so it is
/// corrected against the exact products until `quotient * denominator <= numerator`
/// holds with the next integer above it failing.
fn floor_ratio(numerator: Decimal, denominator: Decimal) -> i64 {
    let mut quotient = (numerator / denominator).trunc();
    while quotient > Decimal::ZERO && quotient * denominator > numerator {
        quotient -= Decimal::ONE;
    }
    while (quotient + Decimal::ONE) * denominator <= numerator {
        quotient += Decimal::ONE;
    }

    quotient.to_i64().unwrap_or(i64::MAX)
}

/// Computes the percent of daily value of an amount against the built-in table.
pub fn compute_percent(key: NutrientKey, amount: Option<&NutrientAmount>) -> String {
    DAILY_VALUES.percent(key, amount)
}
