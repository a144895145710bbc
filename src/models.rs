use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Numeric,
    Date,
    Empty,
}

/// One cell as stored in the sheet. A single cell may stand for `repeat`
/// identical adjacent columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    /// What the spreadsheet displays, e.g. `800 €` or `01/01/23`.
    pub text: String,
    /// Typed value as exported to CSV, e.g. `800 EUR` or `2023-01-01`.
    /// `None` means the display text is the value.
    pub value: Option<String>,
    pub repeat: usize,
    #[allow(dead_code)]
    pub style: Option<String>,
    #[allow(dead_code)]
    pub validation: Option<String>,
}

impl Cell {
    pub fn new(kind: CellKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            value: None,
            repeat: 1,
            style: None,
            validation: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::empty()
        } else {
            Self::new(CellKind::Text, text)
        }
    }

    pub fn empty() -> Self {
        Self::new(CellKind::Empty, "")
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Repeat counts below one are clamped so expansion never loses a column.
    pub fn repeated(mut self, count: usize) -> Self {
        self.repeat = count.max(1);
        self
    }

    pub fn display(&self) -> &str {
        &self.text
    }

    pub fn raw(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }

    pub fn is_blank(&self) -> bool {
        self.kind == CellKind::Empty || (self.text.is_empty() && self.raw().is_empty())
    }
}

/// An ordered run of cells. Widths differ from row to row, so callers index
/// through [`Row::display_at`] rather than assuming a rectangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    #[cfg(test)]
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Cell::text(*t)).collect())
    }

    /// Total column count once repeats are expanded.
    pub fn width(&self) -> usize {
        self.cells.iter().map(|c| c.repeat).sum()
    }

    /// Expanded width up to and including the last non-blank cell.
    pub fn populated_width(&self) -> usize {
        let mut width = 0;
        let mut populated = 0;
        for cell in &self.cells {
            width += cell.repeat;
            if !cell.is_blank() {
                populated = width;
            }
        }
        populated
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    #[cfg(test)]
    pub fn display_values(&self) -> Vec<String> {
        self.expand(self.width(), Cell::display)
    }

    #[cfg(test)]
    pub fn raw_values(&self) -> Vec<String> {
        self.expand(self.width(), Cell::raw)
    }

    /// Raw values of the first `limit` expanded columns, without building the
    /// (possibly huge) tail of a trailing repeated cell.
    pub fn raw_values_to(&self, limit: usize) -> Vec<String> {
        self.expand(limit, Cell::raw)
    }

    pub fn display_values_to(&self, limit: usize) -> Vec<String> {
        self.expand(limit, Cell::display)
    }

    pub fn display_at(&self, column: usize) -> Option<&str> {
        self.cell_at(column).map(Cell::display)
    }

    fn cell_at(&self, column: usize) -> Option<&Cell> {
        let mut end = 0;
        for cell in &self.cells {
            end += cell.repeat;
            if column < end {
                return Some(cell);
            }
        }
        None
    }

    fn expand(&self, limit: usize, pick: fn(&Cell) -> &str) -> Vec<String> {
        let mut out = Vec::with_capacity(limit.min(self.width()));
        for cell in &self.cells {
            if out.len() >= limit {
                break;
            }
            let take = cell.repeat.min(limit - out.len());
            out.extend(std::iter::repeat(pick(cell).to_string()).take(take));
        }
        out
    }
}

/// One (row, month) pair read from the salary sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryRecord {
    pub category: String,
    pub item: String,
    pub month: String,
    pub value: String,
}

impl SalaryRecord {
    pub fn new(category: &str, item: &str, month: &str, value: &str) -> Self {
        Self {
            category: category.to_string(),
            item: item.to_string(),
            month: month.to_string(),
            value: value.to_string(),
        }
    }
}

/// Typed view of one cleaned account movement.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAccountRow {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub expense: Option<f64>,
    pub income: Option<f64>,
    pub category: Option<String>,
    pub account: Option<String>,
    pub is_saving: Option<String>,
    pub is_settled: Option<String>,
    pub provision_to_pay: Option<f64>,
    pub provision_to_recover: Option<f64>,
    pub file_year: Option<i64>,
    pub date_out_of_bound: bool,
}

/// A cell the cleaner kept but could not map into its closed domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQualityWarning {
    pub row: usize,
    pub column: String,
    pub value: String,
}
