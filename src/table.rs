use std::path::Path;

use crate::error::{ComptesError, Result};
use crate::sheet::Sheet;

pub const FILE_YEAR_COLUMN: &str = "File Year";

/// Header labels plus raw data rows aligned to them. Labels need not be unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RectangularTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RectangularTable {
    #[cfg(test)]
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.header.iter().position(|h| h == label)
    }

    #[cfg(test)]
    pub fn column(&self, label: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(label)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Append a constant `File Year` column.
    pub fn tag_file_year(&mut self, year: i32) {
        let value = year.to_string();
        match self.column_index(FILE_YEAR_COLUMN) {
            Some(idx) => {
                for row in &mut self.rows {
                    row.resize(self.header.len(), String::new());
                    row[idx] = value.clone();
                }
            }
            None => {
                self.header.push(FILE_YEAR_COLUMN.to_string());
                let width = self.header.len();
                for row in &mut self.rows {
                    row.resize(width - 1, String::new());
                    row.push(value.clone());
                }
            }
        }
    }

    /// Stack tables on the union of their headers, in first-seen order.
    /// Cells for columns a table lacks are left empty.
    pub fn concat(tables: Vec<RectangularTable>) -> RectangularTable {
        let mut header: Vec<String> = Vec::new();
        for t in &tables {
            for h in &t.header {
                if !header.contains(h) {
                    header.push(h.clone());
                }
            }
        }
        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.len()).sum());
        for t in tables {
            let mapping: Vec<Option<usize>> = header.iter().map(|h| t.column_index(h)).collect();
            for row in t.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|m| m.and_then(|i| row.get(i).cloned()).unwrap_or_default())
                        .collect(),
                );
            }
        }
        RectangularTable { header, rows }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<RectangularTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(header.len(), String::new());
            rows.push(row);
        }
        Ok(RectangularTable { header, rows })
    }
}

/// Build a table from the header row at `header_index` and every row after it.
///
/// The header stops at its last populated column. Data rows are padded or cut
/// to that width. Blank rows at the very end of the sheet are padding and are
/// not emitted; blank rows between data rows are kept.
pub fn extract_table(sheet: &Sheet, header_index: usize) -> RectangularTable {
    let Some(header_row) = sheet.row(header_index) else {
        return RectangularTable::default();
    };
    let width = header_row.populated_width();
    let header = header_row.raw_values_to(width);

    let body = sheet.rows.get(header_index + 1..).unwrap_or(&[]);
    let last_data = body.iter().rposition(|r| !r.is_blank()).map_or(0, |i| i + 1);

    let rows = body[..last_data]
        .iter()
        .map(|r| {
            let mut values = r.raw_values_to(r.populated_width().min(width));
            values.resize(width, String::new());
            values
        })
        .collect();

    RectangularTable { header, rows }
}

/// Year encoded in the last four characters of the file stem, e.g. `Comptes_2019.csv`.
pub fn file_year(path: &Path) -> Result<i32> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ComptesError::FileNaming(name.clone()))?;
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() < 4 {
        return Err(ComptesError::FileNaming(name));
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    if !tail.chars().all(|c| c.is_ascii_digit()) {
        return Err(ComptesError::FileNaming(name));
    }
    tail.parse().map_err(|_| ComptesError::FileNaming(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Row};
    use std::path::PathBuf;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn account_sheet() -> Sheet {
        Sheet::with_rows(
            "Mouvements",
            vec![
                Row::from_texts(&["Comptes 2023"]),
                Row::from_texts(&[]),
                Row::new(vec![
                    Cell::text("Date"),
                    Cell::text("Description"),
                    Cell::text("Dépense"),
                    Cell::empty().repeated(1000),
                ]),
                Row::from_texts(&["2023-01-02", "Boulangerie", "3 EUR"]),
                Row::from_texts(&[]),
                Row::from_texts(&["2023-01-03", "Loyer", "800 EUR", "", "stray"]),
                Row::from_texts(&["2023-01-04"]),
                Row::new(vec![Cell::empty().repeated(1024)]),
                Row::from_texts(&[]),
            ],
        )
    }

    #[test]
    fn test_extract_table_shape() {
        let table = extract_table(&account_sheet(), 2);
        assert_eq!(table.header, strings(&["Date", "Description", "Dépense"]));
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[0], strings(&["2023-01-02", "Boulangerie", "3 EUR"]));
        assert_eq!(table.rows[1], strings(&["", "", ""]));
        assert_eq!(table.rows[2], strings(&["2023-01-03", "Loyer", "800 EUR"]));
        assert_eq!(table.rows[3], strings(&["2023-01-04", "", ""]));
    }

    #[test]
    fn test_extract_table_out_of_range_header() {
        assert!(extract_table(&account_sheet(), 99).is_empty());
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = RectangularTable::new(strings(&["Date", "Dépense"]), vec![strings(&["2022-01-01", "1 EUR"])]);
        let b = RectangularTable::new(
            strings(&["Date", "Organisme", "Dépense"]),
            vec![strings(&["2023-01-01", "CPAM", "2 EUR"])],
        );
        let c = RectangularTable::concat(vec![a, b]);
        assert_eq!(c.header, strings(&["Date", "Dépense", "Organisme"]));
        assert_eq!(c.rows[0], strings(&["2022-01-01", "1 EUR", ""]));
        assert_eq!(c.rows[1], strings(&["2023-01-01", "2 EUR", "CPAM"]));
    }

    #[test]
    fn test_tag_file_year() {
        let mut t = RectangularTable::new(strings(&["Date"]), vec![strings(&["2023-01-01"]), vec![]]);
        t.tag_file_year(2023);
        assert_eq!(t.header, strings(&["Date", "File Year"]));
        assert_eq!(t.column("File Year").unwrap(), vec!["2023", "2023"]);
        t.tag_file_year(2024);
        assert_eq!(t.header.len(), 2);
        assert_eq!(t.column("File Year").unwrap(), vec!["2024", "2024"]);
    }

    #[test]
    fn test_csv_roundtrip_keeps_order_and_accents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Comptes_2023.csv");
        let table = extract_table(&account_sheet(), 2);
        table.write_csv(&path).unwrap();
        let back = RectangularTable::read_csv(&path).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_file_year() {
        assert_eq!(file_year(&PathBuf::from("Comptes_2019.csv")).unwrap(), 2019);
        assert_eq!(file_year(&PathBuf::from("/tmp/x/Comptes 2023.ods")).unwrap(), 2023);
    }

    #[test]
    fn test_file_year_rejects_short_or_non_numeric() {
        for name in ["Comptes_19.csv", "Comptes.csv", "Comptes_20a9.csv", "19.csv"] {
            let err = file_year(&PathBuf::from(name)).unwrap_err();
            assert!(matches!(err, ComptesError::FileNaming(_)), "{name}");
        }
    }
}
