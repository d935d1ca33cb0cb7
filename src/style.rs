use crate::label::{row_kinds, RowKind};
use crate::nutrient::Emphasis;

/// The font size of the table body, in points.
pub const TABLE_FONT_SIZE: f32 = 8.0;
/// The padding a cell has unless a directive says otherwise, in points.
pub const DEFAULT_VERTICAL_PADDING: f32 = 3.0;
pub const DEFAULT_HORIZONTAL_PADDING: f32 = 6.0;
/// The vertical padding of every row below the serving size.
pub const ROW_PADDING: f32 = 2.0;

/// An RGB color with components in the `0.0..=1.0` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        red: 0.0,
        green: 0.0,
        blue: 0.0,
    };
    pub const GRAY: Color = Color {
        red: 0.5,
        green: 0.5,
        blue: 0.5,
    };

    pub fn components(&self) -> [f32; 3] {
        [self.red, self.green, self.blue]
    }
}

/// A horizontal line drawn below a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub width: f32,
    pub color: Color,
}

impl Rule {
    /// The hairline separating ordinary rows.
    pub const THIN: Rule = Rule {
        width: 0.5,
        color: Color::GRAY,
    };
    /// The heavy bar closing the serving size and the macronutrient block.
    pub const BOLD: Rule = Rule {
        width: 4.0,
        color: Color::BLACK,
    };
    /// The medium bar closing the calories and the micronutrient block.
    pub const THICK: Rule = Rule {
        width: 2.0,
        color: Color::BLACK,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleCommand {
    Font(FontWeight),
    FontSize(f32),
    Align(Alignment),
    LineBelow(Rule),
    TopPadding(f32),
    BottomPadding(f32),
}

/// A table cell, addressed by column and row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub column: usize,
    pub row: usize,
}

impl Cell {
    pub fn new(column: usize, row: usize) -> Cell {
        Cell { column, row }
    }
}

/// A style command applied to the rectangle of cells between `start` and `end`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDirective {
    pub command: StyleCommand,
    pub start: Cell,
    pub end: Cell,
}

impl StyleDirective {
    pub fn new(command: StyleCommand, start: Cell, end: Cell) -> StyleDirective {
        StyleDirective {
            command,
            start,
            end,
        }
    }

    fn row(command: StyleCommand, row: usize) -> StyleDirective {
        StyleDirective::new(command, Cell::new(0, row), Cell::new(1, row))
    }

    pub fn covers(&self, column: usize, row: usize) -> bool {
        (self.start.column..=self.end.column).contains(&column)
            && (self.start.row..=self.end.row).contains(&row)
    }
}

/// The look of one row, attached to its kind and to its position within the nutrient blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowStyle {
    font_size: Option<f32>,
    label_size: Option<f32>,
    label_weight: FontWeight,
    value_weight: FontWeight,
    line_below: Option<Rule>,
    top_padding: Option<f32>,
    bottom_padding: Option<f32>,
}

impl RowStyle {
    fn plain() -> RowStyle {
        RowStyle {
            font_size: None,
            label_size: None,
            label_weight: FontWeight::Regular,
            value_weight: FontWeight::Regular,
            line_below: None,
            top_padding: None,
            bottom_padding: None,
        }
    }

    fn bold() -> RowStyle {
        RowStyle {
            label_weight: FontWeight::Bold,
            value_weight: FontWeight::Bold,
            ..RowStyle::plain()
        }
    }
}

fn is_micronutrient(kind: Option<RowKind>) -> bool {
    matches!(kind, Some(RowKind::Nutrient(key)) if key.is_micronutrient())
}

fn row_style(kind: RowKind, previous: Option<RowKind>, next: Option<RowKind>) -> RowStyle {
    let mut style = match kind {
        RowKind::ServingSize => RowStyle {
            font_size: Some(12.0),
            line_below: Some(Rule::BOLD),
            bottom_padding: Some(8.0),
            ..RowStyle::bold()
        },
        RowKind::Calories => RowStyle {
            font_size: Some(20.0),
            line_below: Some(Rule::THICK),
            bottom_padding: Some(16.0),
            ..RowStyle::bold()
        },
        RowKind::PercentHeader => RowStyle::bold(),
        RowKind::Nutrient(key) => {
            let (label_weight, label_size) = match key.emphasis() {
                Emphasis::Headline => (FontWeight::Bold, Some(9.0)),
                Emphasis::Bold => (FontWeight::Bold, None),
                Emphasis::Regular => (FontWeight::Regular, None),
            };
            let value_weight = if key.is_micronutrient() {
                FontWeight::Regular
            } else {
                FontWeight::Bold
            };

            let mut style = RowStyle {
                label_size,
                label_weight,
                value_weight,
                ..RowStyle::plain()
            };
            if !key.is_micronutrient() && is_micronutrient(next) {
                style.line_below = Some(Rule::BOLD);
                style.bottom_padding = Some(4.0);
            }
            if key.is_micronutrient() && !is_micronutrient(previous) {
                style.top_padding = Some(5.0);
            }
            style
        }
    };

    if next.is_none() {
        style.line_below = Some(Rule::THICK);
    }
    style
}

/// Builds the style directives of the nutrition table.
///
/// The directives start with the defaults of the whole table and continue with the
/// overrides of every row, derived from the row kinds. They do not depend on the
/// nutrient values.
pub fn build_style_directives() -> Vec<StyleDirective> {
    let kinds: Vec<RowKind> = row_kinds().collect();
    let last_row = kinds.len() - 1;
    let whole_table = (Cell::new(0, 0), Cell::new(1, last_row));
    let below_first_row = (Cell::new(0, 1), Cell::new(1, last_row));

    let mut directives = vec![
        StyleDirective::new(StyleCommand::Font(FontWeight::Regular), whole_table.0, whole_table.1),
        StyleDirective::new(StyleCommand::FontSize(TABLE_FONT_SIZE), whole_table.0, whole_table.1),
        StyleDirective::new(StyleCommand::Align(Alignment::Left), whole_table.0, whole_table.1),
        StyleDirective::new(
            StyleCommand::Align(Alignment::Right),
            Cell::new(1, 0),
            Cell::new(1, last_row),
        ),
        StyleDirective::new(StyleCommand::LineBelow(Rule::THIN), whole_table.0, whole_table.1),
        StyleDirective::new(StyleCommand::TopPadding(ROW_PADDING), below_first_row.0, below_first_row.1),
        StyleDirective::new(
            StyleCommand::BottomPadding(ROW_PADDING),
            below_first_row.0,
            below_first_row.1,
        ),
    ];

    for (row, kind) in kinds.iter().enumerate() {
        let previous = row.checked_sub(1).and_then(|index| kinds.get(index)).copied();
        let next = kinds.get(row + 1).copied();
        let style = row_style(*kind, previous, next);

        if let Some(font_size) = style.font_size {
            directives.push(StyleDirective::row(StyleCommand::FontSize(font_size), row));
        }
        if let Some(label_size) = style.label_size {
            directives.push(StyleDirective::new(
                StyleCommand::FontSize(label_size),
                Cell::new(0, row),
                Cell::new(0, row),
            ));
        }
        match (style.label_weight, style.value_weight) {
            (FontWeight::Bold, FontWeight::Bold) => {
                directives.push(StyleDirective::row(StyleCommand::Font(FontWeight::Bold), row));
            }
            (label_weight, value_weight) => {
                for (column, weight) in [(0, label_weight), (1, value_weight)] {
                    if weight == FontWeight::Bold {
                        directives.push(StyleDirective::new(
                            StyleCommand::Font(FontWeight::Bold),
                            Cell::new(column, row),
                            Cell::new(column, row),
                        ));
                    }
                }
            }
        }
        if let Some(rule) = style.line_below {
            directives.push(StyleDirective::row(StyleCommand::LineBelow(rule), row));
        }
        if let Some(padding) = style.top_padding {
            directives.push(StyleDirective::row(StyleCommand::TopPadding(padding), row));
        }
        if let Some(padding) = style.bottom_padding {
            directives.push(StyleDirective::row(StyleCommand::BottomPadding(padding), row));
        }
    }

    directives
}

/// The resolved style of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    pub weight: FontWeight,
    pub font_size: f32,
    pub alignment: Alignment,
    pub line_below: Option<Rule>,
    pub top_padding: f32,
    pub bottom_padding: f32,
    pub left_padding: f32,
    pub right_padding: f32,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            weight: FontWeight::Regular,
            font_size: 10.0,
            alignment: Alignment::Left,
            line_below: None,
            top_padding: DEFAULT_VERTICAL_PADDING,
            bottom_padding: DEFAULT_VERTICAL_PADDING,
            left_padding: DEFAULT_HORIZONTAL_PADDING,
            right_padding: DEFAULT_HORIZONTAL_PADDING,
        }
    }
}

impl CellStyle {
    fn apply(&mut self, command: StyleCommand) {
        match command {
            StyleCommand::Font(weight) => self.weight = weight,
            StyleCommand::FontSize(font_size) => self.font_size = font_size,
            StyleCommand::Align(alignment) => self.alignment = alignment,
            StyleCommand::LineBelow(rule) => self.line_below = Some(rule),
            StyleCommand::TopPadding(padding) => self.top_padding = padding,
            StyleCommand::BottomPadding(padding) => self.bottom_padding = padding,
        }
    }
}

/// The styles of all the cells of a table, obtained by applying the directives in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyleSheet {
    columns: usize,
    rows: usize,
    cells: Vec<CellStyle>,
}

impl CellStyleSheet {
    pub fn resolve(directives: &[StyleDirective], columns: usize, rows: usize) -> CellStyleSheet {
        let mut cells = vec![CellStyle::default(); columns * rows];

        for directive in directives.iter().filter(|_| columns > 0 && rows > 0) {
            if directive.end.column >= columns || directive.end.row >= rows {
                log::warn!(
                    "The style directive {:?} reaches outside of the {}x{} table, it is clipped",
                    directive,
                    columns,
                    rows
                );
            }
            for row in directive.start.row..=directive.end.row.min(rows.saturating_sub(1)) {
                for column in directive.start.column..=directive.end.column.min(columns.saturating_sub(1)) {
                    cells[row * columns + column].apply(directive.command);
                }
            }
        }

        CellStyleSheet {
            columns,
            rows,
            cells,
        }
    }

    /// The style of the given cell, if the cell belongs to the table.
    pub fn cell(&self, column: usize, row: usize) -> Option<&CellStyle> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}
