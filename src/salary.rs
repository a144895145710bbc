use crate::error::{ComptesError, Result};
use crate::frame::{Frame, Value};
use crate::locator::find_pivot_column;
use crate::models::SalaryRecord;
use crate::normalize::{locale_number, strip_currency};
use crate::sheet::Sheet;

pub const SALARY_COLUMNS: [&str; 5] = ["catégorie", "poste", "mois", "valeur", "Valeur Numérique"];

/// Where the month headers and item labels sit in the salary sheet. The
/// category is read from the column just before the label column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotLayout {
    pub header_row: usize,
    pub label_column: usize,
}

impl Default for PivotLayout {
    fn default() -> Self {
        Self {
            header_row: 2,
            label_column: 1,
        }
    }
}

/// Unpivot the (category × month) salary sheet into one record per item and month.
pub fn parse_salary_sheet(sheet: &Sheet, layout: &PivotLayout) -> Result<Vec<SalaryRecord>> {
    let y_start = find_pivot_column(sheet, layout.header_row)?;
    let months = sheet
        .row(layout.header_row)
        .map(|r| r.display_values_to(r.populated_width()))
        .unwrap_or_default();
    tracing::debug!(
        sheet = %sheet.name,
        first_month_column = y_start,
        months = months.len().saturating_sub(y_start),
        "salary header located"
    );

    let mut records = Vec::new();
    for (i, row) in sheet.rows.iter().enumerate() {
        // The month header pairs with itself; never a value row.
        if i == layout.header_row {
            continue;
        }
        let values = row.display_values_to(row.populated_width());
        let Some(item) = values.get(layout.label_column) else { continue };
        if item.is_empty() {
            continue;
        }
        let category = layout
            .label_column
            .checked_sub(1)
            .and_then(|c| values.get(c))
            .map(String::as_str)
            .unwrap_or("");
        for (j, value) in values.iter().enumerate().skip(y_start) {
            let month = months.get(j).map(String::as_str).unwrap_or("");
            records.push(SalaryRecord::new(category, item, month, strip_currency(value)));
        }
    }
    Ok(records)
}

/// Tabulate salary records and add the parsed `Valeur Numérique` column.
pub fn salary_frame(records: &[SalaryRecord]) -> Result<Frame> {
    let mut frame = Frame::new(SALARY_COLUMNS.iter().map(|c| c.to_string()).collect());
    for (i, r) in records.iter().enumerate() {
        let numeric = locale_number(&r.value).map_err(|m| ComptesError::NumericParse {
            row: i,
            column: "valeur".to_string(),
            value: m.0,
        })?;
        frame.rows.push(vec![
            Value::text(&r.category),
            Value::text(&r.item),
            Value::text(&r.month),
            Value::text(&r.value),
            numeric.map_or(Value::Null, Value::Number),
        ]);
    }
    Ok(frame)
}
