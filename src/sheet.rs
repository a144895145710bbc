use std::path::Path;

use crate::error::{ComptesError, Result};
use crate::models::Row;

/// One named tab, held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(name: &str, rows: Vec<Row>) -> Self {
        Self {
            name: name.to_string(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub sheets: Vec<Sheet>,
}

impl Document {
    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ComptesError::SheetNotFound(name.to_string()))
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Open a spreadsheet by extension: `.ods` natively, `.xlsx`/`.xls` through calamine.
pub fn open_document(path: &Path) -> Result<Document> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let sheets = match ext.as_str() {
        "ods" => crate::ods::read_ods(path)?,
        #[cfg(feature = "xlsx")]
        "xlsx" | "xlsm" | "xls" => read_excel(path)?,
        _ => {
            return Err(ComptesError::DocumentLoad {
                path: path.display().to_string(),
                reason: format!("unsupported file type '{ext}'"),
            })
        }
    };
    let document = Document { sheets };
    tracing::debug!(path = %path.display(), sheets = ?document.sheet_names(), "document opened");
    Ok(document)
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_datetime(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let seconds = (serial * 86_400.0).round() as i64;
    let dt = base + chrono::Duration::seconds(seconds);
    if seconds % 86_400 == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(feature = "xlsx")]
fn read_excel(path: &Path) -> Result<Vec<Sheet>> {
    use calamine::{Data, Reader};

    use crate::models::{Cell, CellKind};

    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| ComptesError::DocumentLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut sheets = Vec::new();
    for (name, range) in workbook.worksheets() {
        // calamine ranges start at the first used cell; pad back to A1.
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut rows = vec![Row::default(); row_offset as usize];
        for data_row in range.rows() {
            let mut cells = Vec::with_capacity(data_row.len() + 1);
            if col_offset > 0 {
                cells.push(Cell::empty().repeated(col_offset as usize));
            }
            for data in data_row {
                let cell = match data {
                    Data::String(s) => Cell::text(s.clone()),
                    Data::Float(f) => Cell::new(CellKind::Numeric, f.to_string()),
                    Data::Int(i) => Cell::new(CellKind::Numeric, i.to_string()),
                    Data::Bool(b) => Cell::text(if *b { "True" } else { "False" }),
                    Data::DateTime(dt) => Cell::new(CellKind::Date, excel_serial_to_datetime(dt.as_f64())),
                    Data::DateTimeIso(s) => Cell::new(CellKind::Date, s.replacen('T', " ", 1)),
                    Data::DurationIso(s) => Cell::new(CellKind::Date, s.clone()),
                    Data::Error(e) => Cell::text(e.to_string()),
                    Data::Empty => Cell::empty(),
                };
                cells.push(cell);
            }
            rows.push(Row::new(cells));
        }
        sheets.push(Sheet::with_rows(&name, rows));
    }
    Ok(sheets)
}
