use crate::label::LabelContent;
use crate::style::{
    Alignment, Cell, CellStyleSheet, FontWeight, Rule, StyleCommand, StyleDirective,
};

/// The width of the label table, in millimeters.
pub const TABLE_WIDTH: f32 = 72.0;
/// The width of the page: the table plus a 2 mm margin on both sides, in millimeters.
pub const PAGE_WIDTH: f32 = TABLE_WIDTH + 4.0;
/// The height of the page, in millimeters.
pub const PAGE_HEIGHT: f32 = 132.0;
/// The share of the table width taken by the description column.
pub const FIRST_COLUMN_SHARE: f32 = 0.67;
pub const SECOND_COLUMN_SHARE: f32 = 0.33;

/// The padding between the page border and the content, in points.
pub const FRAME_PADDING: f32 = 6.0;
pub const HEADER_FONT_SIZE: f32 = 18.0;
pub const FOOTER_FONT_SIZE: f32 = 7.0;
pub const FOOTER_LEADING: f32 = 7.0;
/// The vertical gap between the table and the footer, in points.
pub const SPACER_HEIGHT: f32 = 4.0;
/// The line height of a font relative to its size, unless stated otherwise.
pub const LEADING_FACTOR: f32 = 1.2;
/// The font size of an empty cell which has no explicit size.
const EMPTY_CELL_FONT_SIZE: f32 = 10.0;

/// Converts millimeters to points. This function is used in order to present the data
/// in the format required by the PDF specification, while the label geometry is
/// easier to reason about in millimeters.
pub fn millimeters_to_points(millimeters: f32) -> f32 {
    millimeters * 2.834646
}

/// Measures the advance width of a text when set in the given weight and size.
pub trait TextMeasure {
    fn text_width(&self, text: &str, weight: FontWeight, font_size: f32) -> f32;
}

/// A run of text placed on the page; `position` is the start of its baseline in points,
/// measured from the bottom-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub weight: FontWeight,
    pub font_size: f32,
    pub position: [f32; 2],
}

/// A horizontal line placed on the page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRule {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub rule: Rule,
}

/// The complete positioned content of the single label page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    pub texts: Vec<PlacedText>,
    pub rules: Vec<PlacedRule>,
}

/// Stacks the content of a page from top to bottom, the way a document frame does.
struct Frame<'a> {
    measure: &'a dyn TextMeasure,
    left: f32,
    width: f32,
    cursor: f32,
    texts: Vec<PlacedText>,
    rules: Vec<PlacedRule>,
}

impl<'a> Frame<'a> {
    fn new(measure: &'a dyn TextMeasure, page_width: f32, page_height: f32) -> Frame<'a> {
        Frame {
            measure,
            left: FRAME_PADDING,
            width: page_width - 2.0 * FRAME_PADDING,
            cursor: page_height - FRAME_PADDING,
            texts: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Lays out a word-wrapped paragraph, either centered or flush left.
    fn paragraph(
        &mut self,
        text: &str,
        weight: FontWeight,
        font_size: f32,
        leading: f32,
        alignment: Alignment,
    ) {
        let lines = wrap_words(text, self.width, |line| {
            self.measure.text_width(line, weight, font_size)
        });

        for (index, line) in lines.iter().enumerate() {
            let x = match alignment {
                Alignment::Left => self.left,
                Alignment::Right => {
                    self.left + self.width - self.measure.text_width(line, weight, font_size)
                }
            };
            let baseline = self.cursor - font_size - index as f32 * leading;
            self.texts.push(PlacedText {
                text: line.clone(),
                weight,
                font_size,
                position: [x, baseline],
            });
        }

        self.cursor -= (lines.len() as f32 * leading).max(font_size);
    }

    fn centered_paragraph(&mut self, text: &str, weight: FontWeight, font_size: f32) {
        let lines = wrap_words(text, self.width, |line| {
            self.measure.text_width(line, weight, font_size)
        });
        let leading = font_size * LEADING_FACTOR;

        for (index, line) in lines.iter().enumerate() {
            let line_width = self.measure.text_width(line, weight, font_size);
            self.texts.push(PlacedText {
                text: line.clone(),
                weight,
                font_size,
                position: [
                    self.left + (self.width - line_width) / 2.0,
                    self.cursor - font_size - index as f32 * leading,
                ],
            });
        }

        self.cursor -= lines.len() as f32 * leading;
    }

    /// Lays out a table centered in the frame. Every row is as tall as its tallest cell,
    /// text sits on the bottom padding of its cell.
    fn table(&mut self, cells: &[Vec<String>], column_widths: &[f32], sheet: &CellStyleSheet) {
        let table_width: f32 = column_widths.iter().sum();
        let table_left = self.left + (self.width - table_width) / 2.0;

        for (row, row_cells) in cells.iter().enumerate() {
            let row_height = (0..column_widths.len())
                .filter_map(|column| sheet.cell(column, row))
                .map(|style| style.font_size * LEADING_FACTOR + style.top_padding + style.bottom_padding)
                .fold(0.0, f32::max);
            let row_bottom = self.cursor - row_height;

            let mut cell_left = table_left;
            for (column, column_width) in column_widths.iter().enumerate() {
                let Some(style) = sheet.cell(column, row) else {
                    cell_left += column_width;
                    continue;
                };
                let cell_right = cell_left + column_width;

                if let Some(text) = row_cells.get(column).filter(|text| !text.is_empty()) {
                    let x = match style.alignment {
                        Alignment::Left => cell_left + style.left_padding,
                        Alignment::Right => {
                            cell_right
                                - style.right_padding
                                - self.measure.text_width(text, style.weight, style.font_size)
                        }
                    };
                    self.texts.push(PlacedText {
                        text: text.clone(),
                        weight: style.weight,
                        font_size: style.font_size,
                        position: [
                            x,
                            row_bottom + style.bottom_padding + style.font_size * (LEADING_FACTOR - 1.0),
                        ],
                    });
                }

                if let Some(rule) = style.line_below {
                    self.rules.push(PlacedRule {
                        start: [cell_left, row_bottom],
                        end: [cell_right, row_bottom],
                        rule,
                    });
                }

                cell_left = cell_right;
            }

            self.cursor = row_bottom;
        }
    }

    fn space(&mut self, height: f32) {
        self.cursor -= height;
    }
}

/// Breaks a text into lines no wider than `maximum_width`, keeping words intact. A word
/// wider than the line is given a line of its own.
pub fn wrap_words<F>(text: &str, maximum_width: f32, width_of: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line.push_str(word);
            continue;
        }

        let candidate_line = format!("{} {}", current_line, word);
        if width_of(&candidate_line) <= maximum_width {
            current_line = candidate_line;
        } else {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

/// Positions every element of the label on its page: the centered header, the separator
/// line, the nutrition table, a small gap and the footnote.
pub fn layout_label(content: &LabelContent, measure: &dyn TextMeasure) -> PageLayout {
    let width = millimeters_to_points(PAGE_WIDTH);
    let height = millimeters_to_points(PAGE_HEIGHT);
    let mut frame = Frame::new(measure, width, height);

    frame.centered_paragraph(&content.header, FontWeight::Bold, HEADER_FONT_SIZE);

    let separator_directives = [
        StyleDirective::new(StyleCommand::FontSize(EMPTY_CELL_FONT_SIZE), Cell::new(0, 0), Cell::new(0, 0)),
        StyleDirective::new(StyleCommand::LineBelow(Rule::THIN), Cell::new(0, 0), Cell::new(0, 0)),
        StyleDirective::new(StyleCommand::TopPadding(0.0), Cell::new(0, 0), Cell::new(0, 0)),
        StyleDirective::new(StyleCommand::BottomPadding(1.0), Cell::new(0, 0), Cell::new(0, 0)),
    ];
    frame.table(
        &[vec![String::new()]],
        &[millimeters_to_points(TABLE_WIDTH)],
        &CellStyleSheet::resolve(&separator_directives, 1, 1),
    );

    let cells: Vec<Vec<String>> = content
        .rows
        .iter()
        .map(|row| vec![row.primary_text.clone(), row.secondary_text.clone()])
        .collect();
    let column_widths = [
        millimeters_to_points(TABLE_WIDTH * FIRST_COLUMN_SHARE),
        millimeters_to_points(TABLE_WIDTH * SECOND_COLUMN_SHARE),
    ];
    frame.table(
        &cells,
        &column_widths,
        &CellStyleSheet::resolve(&content.directives, column_widths.len(), cells.len()),
    );

    frame.space(SPACER_HEIGHT);
    frame.paragraph(
        &content.footer,
        FontWeight::Regular,
        FOOTER_FONT_SIZE,
        FOOTER_LEADING,
        Alignment::Left,
    );

    if frame.cursor < FRAME_PADDING {
        log::warn!(
            "The label content overflows the bottom of the page by {:.1} points",
            FRAME_PADDING - frame.cursor
        );
    }

    PageLayout {
        width,
        height,
        texts: frame.texts,
        rules: frame.rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::build_label_content;
    use crate::locale::LabelText;
    use crate::nutrient::{NutrientInput, NutrientKey};

    /// Every character is half as wide as the font size, bold ones slightly wider.
    struct FixedWidthMeasure;

    impl TextMeasure for FixedWidthMeasure {
        fn text_width(&self, text: &str, weight: FontWeight, font_size: f32) -> f32 {
            let character_width = match weight {
                FontWeight::Regular => 0.5,
                FontWeight::Bold => 0.55,
            };
            text.chars().count() as f32 * character_width * font_size
        }
    }

    fn sample_layout() -> PageLayout {
        let input = NutrientInput::new("100г", "250")
            .with_amount(NutrientKey::TotalFat, "12")
            .unwrap();
        let content = build_label_content(&input, &LabelText::russian().unwrap());
        layout_label(&content, &FixedWidthMeasure)
    }

    #[test]
    fn page_is_seventy_six_by_one_hundred_thirty_two_millimeters() {
        let layout = sample_layout();

        assert!((layout.width - 215.43).abs() < 0.01, "{}", layout.width);
        assert!((layout.height - 374.17).abs() < 0.01, "{}", layout.height);
    }

    #[test]
    fn header_is_centered_on_the_page() {
        let layout = sample_layout();
        let header = &layout.texts[0];
        let header_width = FixedWidthMeasure.text_width(&header.text, FontWeight::Bold, 18.0);

        assert_eq!(header.text, "Пищевая Ценность");
        assert_eq!(header.weight, FontWeight::Bold);
        let left_gap = header.position[0];
        let right_gap = layout.width - header.position[0] - header_width;
        assert!((left_gap - right_gap).abs() < 0.01);
    }

    #[test]
    fn percentages_are_right_aligned_in_the_table() {
        let layout = sample_layout();
        let table_left = (layout.width - millimeters_to_points(TABLE_WIDTH)) / 2.0;
        let table_right = table_left + millimeters_to_points(TABLE_WIDTH);

        let percent = layout.texts.iter().find(|text| text.text == "15%").unwrap();
        let percent_right =
            percent.position[0] + FixedWidthMeasure.text_width("15%", percent.weight, percent.font_size);
        assert!((percent_right - (table_right - 6.0)).abs() < 0.01);

        let fat = layout
            .texts
            .iter()
            .find(|text| text.text == "Всего жиров 12г")
            .unwrap();
        assert!((fat.position[0] - (table_left + 6.0)).abs() < 0.01);
        assert_eq!(fat.font_size, 9.0);
    }

    #[test]
    fn rows_go_down_the_page() {
        let layout = sample_layout();
        let baselines: Vec<f32> = ["Размер порции", "Калории", "% Дневной Нормы*", "Калий мг"]
            .iter()
            .map(|label| {
                layout
                    .texts
                    .iter()
                    .find(|text| &text.text == label)
                    .unwrap()
                    .position[1]
            })
            .collect();

        assert!(baselines.windows(2).all(|pair| pair[0] > pair[1]), "{:?}", baselines);
    }

    #[test]
    fn every_row_is_ruled_and_the_content_fits() {
        let layout = sample_layout();

        // One separator line plus two cells for each of the seventeen rows
        assert_eq!(layout.rules.len(), 1 + 2 * 17);
        let heavy_rules = layout
            .rules
            .iter()
            .filter(|placed| placed.rule == Rule::BOLD)
            .count();
        assert_eq!(heavy_rules, 4);
        assert!(layout
            .texts
            .iter()
            .all(|text| text.position[1] > 0.0 && text.position[1] < layout.height));
    }

    #[test]
    fn footer_is_wrapped_within_the_frame() {
        let layout = sample_layout();
        let footer_lines: Vec<&PlacedText> = layout
            .texts
            .iter()
            .filter(|text| text.font_size == FOOTER_FONT_SIZE)
            .collect();

        assert!(footer_lines.len() > 1);
        assert!(footer_lines[0].text.starts_with("* % Дневной Нормы"));
        for line in footer_lines.iter() {
            let line_width = FixedWidthMeasure.text_width(&line.text, FontWeight::Regular, 7.0);
            assert!(line_width <= layout.width - 2.0 * FRAME_PADDING);
        }
        for pair in footer_lines.windows(2) {
            assert!((pair[0].position[1] - pair[1].position[1] - FOOTER_LEADING).abs() < 0.01);
        }
    }

    #[test]
    fn long_words_get_their_own_line() {
        let lines = wrap_words("a bb ccccccccc d", 4.0, |line| line.chars().count() as f32);

        assert_eq!(lines, vec!["a bb", "ccccccccc", "d"]);
        assert!(wrap_words("   ", 4.0, |line| line.len() as f32).is_empty());
    }
}
