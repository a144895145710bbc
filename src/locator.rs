use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ComptesError, Result};
use crate::sheet::Sheet;

/// Month headers of the salary sheet: `DD/MM/YY`, or `MM/YY` when the day is
/// formatted away.
pub const PIVOT_DATE_PATTERN: &str = r"^\d{2}/\d{2}(/\d{2})?";

fn pivot_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PIVOT_DATE_PATTERN).expect("static regex"))
}

/// Index of the first row, top-down, whose `column` holds exactly `anchor`.
pub fn find_header_row(sheet: &Sheet, column: usize, anchor: &str) -> Result<usize> {
    sheet
        .rows
        .iter()
        .position(|row| row.display_at(column).map(str::trim) == Some(anchor))
        .ok_or_else(|| ComptesError::HeaderNotFound {
            sheet: sheet.name.clone(),
            column,
            anchor: anchor.to_string(),
        })
}

/// Index of the first date-like cell, left to right, in the fixed header row.
pub fn find_pivot_column(sheet: &Sheet, header_row: usize) -> Result<usize> {
    let not_found = || ComptesError::PivotNotFound {
        sheet: sheet.name.clone(),
        row: header_row,
    };
    let re = pivot_re();
    let row = sheet.row(header_row).ok_or_else(not_found)?;
    row.display_values_to(row.populated_width())
        .iter()
        .position(|v| re.is_match(v.trim()))
        .ok_or_else(not_found)
}
